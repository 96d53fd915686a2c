#[macro_use]
extern crate bencher;
extern crate qpuzzle;

use bencher::Bencher;

use qpuzzle::prelude::*;
use qpuzzle::puzzle::codec::{decode, encode};
use qpuzzle::puzzle::RuleOperator;

fn run_search(depth: usize) -> SearchResult<SearchReport> {
    let start = Permutation::new(vec![1, 2, 3, 0])?;
    let goal = Permutation::new(vec![0, 2, 1, 3])?;
    let config = SearchConfig::default()
        .with_depth(depth)
        .with_seed(0)
        .with_shots(64);
    PuzzleSearch::new(RuleSet::two_by_two(), config)?.run(&start, &goal)
}

fn bench_search_depth_one(bencher: &mut Bencher) {
    bencher.iter(|| run_search(1).unwrap());
}

fn bench_search_depth_two(bencher: &mut Bencher) {
    bencher.iter(|| run_search(2).unwrap());
}

fn bench_synthesize_six_tiles(bencher: &mut Bencher) {
    let rule = MoveRule::new(1, 4);
    bencher.iter(|| RuleOperator::synthesize(rule, 6, 0).unwrap());
}

fn bench_codec_round_trip(bencher: &mut Bencher) {
    bencher.iter(|| {
        (0..720)
            .map(|i| encode(&decode(i, 6).unwrap()))
            .sum::<usize>()
    });
}

benchmark_group!(
    benches,
    bench_search_depth_one,
    bench_search_depth_two,
    bench_synthesize_six_tiles,
    bench_codec_round_trip
);
benchmark_main!(benches);
