use rand::SeedableRng;
use rand::rngs::StdRng;

use verse_core::model::generator::Generator;
use verse_core::model::markov_model::{MarkovModel, ModelBuilder};
use verse_core::model::tokenizer::is_sentence_end;
use verse_core::{Constraints, GenerateError};

const JABBERWOCKY: &str = "’Twas brillig, and the slithy toves \
	Did gyre and gimble in the wabe: All mimsy were the borogoves, \
	And the mome raths outgrabe. Beware the Jabberwock, my son! \
	The jaws that bite, the claws that catch! Beware the Jubjub bird, and shun \
	The frumious Bandersnatch! He took his vorpal sword in hand; \
	Long time the manxome foe he sought— So rested he by the Tumtum tree \
	And stood awhile in thought. And, as in uffish thought he stood, \
	The Jabberwock, with eyes of flame, Came whiffling through the tulgey wood, \
	And burbled as it came! One, two! One, two! And through and through \
	The vorpal blade went snicker-snack! He left it dead, and with its head \
	He went galumphing back. And hast thou slain the Jabberwock? \
	Come to my arms, my beamish boy! O frabjous day! Callooh! Callay!” \
	He chortled in his joy.";

fn build(order: usize, texts: &[&str]) -> MarkovModel {
	let mut builder = ModelBuilder::new(order).unwrap();
	for (i, text) in texts.iter().enumerate() {
		builder.add_text(&format!("unit-{i}"), text);
	}
	builder.build()
}

#[test]
fn cat_corpus_has_exact_counts() {
	let model = build(2, &["the cat sat the cat ran"]);

	assert_eq!(model.context_count(), 3);

	let the = model.successors(&["the"]).unwrap();
	assert_eq!(the.count("cat"), 2);
	assert_eq!(the.len(), 1);

	let cat = model.successors(&["cat"]).unwrap();
	assert_eq!(cat.count("sat"), 1);
	assert_eq!(cat.count("ran"), 1);
	assert_eq!(cat.len(), 2);

	let sat = model.successors(&["sat"]).unwrap();
	assert_eq!(sat.count("the"), 1);
	assert_eq!(sat.len(), 1);

	assert!(model.successors(&["ran"]).is_none());
}

#[test]
fn ingesting_twice_doubles_every_count() {
	let once = build(3, &[JABBERWOCKY]);
	let twice = build(3, &[JABBERWOCKY, JABBERWOCKY]);

	assert_eq!(once.context_count(), twice.context_count());
	for context in once.contexts() {
		let single = once.successors(context).unwrap();
		let double = twice.successors(context).unwrap();
		assert_eq!(single.len(), double.len());
		for (token, count) in single.iter() {
			assert_eq!(double.count(token), count * 2, "context {context:?} -> {token}");
		}
	}
}

#[test]
fn unit_order_does_not_change_counts() {
	let a = "the cat sat on the mat .";
	let b = "the dog sat on the cat .";
	assert_eq!(build(2, &[a, b]).contexts().count(), build(2, &[b, a]).contexts().count());

	let ab = build(2, &[a, b]);
	let ba = build(2, &[b, a]);
	for context in ab.contexts() {
		assert_eq!(ab.successors(context), ba.successors(context));
	}
}

#[test]
fn every_line_honours_min_length() {
	let model = build(3, &[JABBERWOCKY]);
	let mut rng = StdRng::seed_from_u64(42);

	for min_length in [0, 1, 5, 12] {
		let constraints = Constraints { min_length, ..Constraints::default() };
		let out = Generator::new("jabberwocky", &model).generate(10, &constraints, &mut rng).unwrap();
		for line in out.lines() {
			assert!(line.len() >= min_length, "'{line}' shorter than {min_length}");
			assert!(line.len() <= constraints.token_cap());
			assert!(is_sentence_end(line.tokens().last().unwrap()));
		}
	}
}

#[test]
fn no_duplicates_when_the_model_allows_it() {
	let model = build(2, &[JABBERWOCKY]);
	let constraints = Constraints { allow_duplicates: false, ..Constraints::default() };
	let mut rng = StdRng::seed_from_u64(5);

	let out = Generator::new("jabberwocky", &model).generate(8, &constraints, &mut rng).unwrap();
	assert_eq!(out.len(), 8);
	assert!(out.exhaustion().is_none());

	let mut texts = out.texts();
	texts.sort();
	texts.dedup();
	assert_eq!(texts.len(), 8);
}

#[test]
fn generation_always_terminates() {
	// A chain with a cycle and no terminator at all.
	let model = build(2, &["on and on and on and on"]);
	let mut rng = StdRng::seed_from_u64(0);
	let constraints = Constraints { min_length: 3, temperature: 0.5, max_attempts: 10, ..Constraints::default() };

	let out = Generator::new("loop", &model).generate(4, &constraints, &mut rng).unwrap();
	assert!(out.is_empty());
	assert!(out.is_exhausted());
}

#[test]
fn zero_lines_for_every_model() {
	let mut rng = StdRng::seed_from_u64(0);
	for model in [build(2, &[]), build(2, &["a b ."]), build(3, &[JABBERWOCKY])] {
		let out = Generator::new("m", &model).generate(0, &Constraints::default(), &mut rng).unwrap();
		assert!(out.is_empty());
	}
}

#[test]
fn empty_model_fails_fast() {
	let model = build(4, &[]);
	let mut rng = StdRng::seed_from_u64(0);
	let err = Generator::new("nothing", &model).generate(3, &Constraints::default(), &mut rng).unwrap_err();
	assert!(matches!(err, GenerateError::ModelEmpty(name) if name == "nothing"));
}

#[test]
fn snapshot_round_trip_keeps_the_table() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("jabberwocky.bin");

	let model = build(3, &[JABBERWOCKY]);
	model.save(&path).unwrap();
	assert_eq!(MarkovModel::load(&path).unwrap(), model);
}

#[test]
fn corrupt_snapshot_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("broken.bin");
	std::fs::write(&path, b"\xff\xff\xff").unwrap();
	assert!(MarkovModel::load(&path).is_err());
}
