use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, VecDeque};

use jumpers_rs::Link;

const PREFIXES: [&str; 5] = ["XTK", "XT", "XTN", "X", "K"];
const SIGNALS: [&str; 4] = ["0501", "0502", "24V", "GND"];

/// Random terminal identifier drawn from a pool of `pool` blocks.
#[allow(dead_code)]
pub fn random_terminal(rng: &mut StdRng, pool: u32) -> String {
    let prefix = PREFIXES[rng.random_range(0..PREFIXES.len())];
    let block = rng.random_range(1..=pool.max(1));
    let position = rng.random_range(1..=12);
    format!("{prefix}{block}-b{position}")
}

/// Raw links of one cabinet: mostly pairs, some singletons, with enough
/// terminal reuse to form multi-link components.
#[allow(dead_code)]
pub fn generate_links(cabinet: &str, count: usize, pool: u32, seed: u64) -> Vec<Link> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let signal = SIGNALS[rng.random_range(0..SIGNALS.len())];
            let a = random_terminal(&mut rng, pool);
            if rng.random_bool(0.1) {
                Link::new(cabinet, signal, [a])
            } else {
                let b = random_terminal(&mut rng, pool);
                Link::new(cabinet, signal, [a, b])
            }
        })
        .collect()
}

/// Tab-separated input with `tables` header-delimited tables.
#[allow(dead_code)]
pub fn generate_table(cabinets: u32, rows: usize, tables: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::new();
    for _ in 0..tables.max(1) {
        text.push_str("Откуда\tКуда\tСигнал\n");
        for _ in 0..rows {
            let cabinet = format!("{}HV{}", rng.random_range(1..=cabinets.max(1)), 19);
            let signal = SIGNALS[rng.random_range(0..SIGNALS.len())];
            let a = random_terminal(&mut rng, 8);
            if rng.random_bool(0.1) {
                text.push_str(&format!("{cabinet}\t{signal}\t{a}\n"));
            } else {
                let b = random_terminal(&mut rng, 8);
                text.push_str(&format!("{cabinet}\t{signal}\t{a}\t{b}\n"));
            }
        }
    }
    text
}

/// Shuffled copy of `links`.
#[allow(dead_code)]
pub fn shuffled(links: &[Link], seed: u64) -> Vec<Link> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut copy = links.to_vec();
    copy.shuffle(&mut rng);
    copy
}

/// Terminal sets of `links`, sorted, for order-insensitive comparison.
#[allow(dead_code)]
pub fn terminal_sets(links: &[Link]) -> BTreeSet<BTreeSet<String>> {
    links
        .iter()
        .map(|link| link.terminals().map(str::to_string).collect())
        .collect()
}

/// Connected components by breadth-first search over links.
#[allow(dead_code)]
pub fn reference_components(links: &[Link]) -> BTreeSet<BTreeSet<String>> {
    let links: Vec<&Link> = links.iter().filter(|link| !link.is_empty()).collect();
    let mut visited = vec![false; links.len()];
    let mut components = BTreeSet::new();

    for start in 0..links.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            component.extend(links[current].terminals().map(str::to_string));
            for next in 0..links.len() {
                if !visited[next] && links[current].intersects(links[next]) {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        components.insert(component);
    }

    components
}
