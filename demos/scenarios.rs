use iqp_gap::{
    compile, evaluate_gap, oracle, random_polynomial, BackendKind, GeneratorConfig, Polynomial,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

fn scenario(name: &str, poly: &Polynomial) {
    let gap = oracle::gap(poly);
    println!("{name}: {poly}  (N = {})", poly.num_vars());
    match compile(poly) {
        Ok(circuit) => println!("  circuit: {circuit}"),
        Err(err) => println!("  circuit: {err}"),
    }
    println!(
        "  oracle: gap = {gap}, p = {:.6}",
        oracle::probability_from_gap(gap, poly.num_vars())
    );
    for kind in BackendKind::ALL {
        let backend = kind.build();
        match evaluate_gap(backend.as_ref(), poly) {
            Ok(p) => println!("  {:>16}: p = {p:.6}", backend.name()),
            Err(err) => println!("  {:>16}: {err}", backend.name()),
        }
    }
}

fn main() {
    let fixed = [
        (
            "A",
            Polynomial::new(3, [vec![0usize, 1, 2], vec![0, 2], vec![1, 2], vec![0]]),
        ),
        (
            "B",
            Polynomial::new(4, [vec![0usize, 1], vec![0, 2], vec![1, 2], vec![0]]),
        ),
        ("degree four", Polynomial::new(4, [vec![0usize, 1, 2, 3]])),
    ];
    for (name, poly) in fixed {
        match poly {
            Ok(poly) => scenario(name, &poly),
            Err(err) => eprintln!("{name}: {err}"),
        }
    }

    let max_vars = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(12);
    println!();
    println!(
        "{:>5} | {:>12} | {:>14} | {:>14}",
        "vars", "oracle(ms)", "state-vec(ms)", "density(ms)"
    );
    println!("{}", "-".repeat(56));
    let mut rng = StdRng::seed_from_u64(2024);
    for vars in (4..=max_vars).step_by(2) {
        let config = GeneratorConfig {
            num_vars: vars,
            num_monomials: vars,
            max_degree: 3,
        };
        let poly = match random_polynomial(&mut rng, &config) {
            Ok(poly) => poly,
            Err(err) => {
                eprintln!("{vars}: {err}");
                continue;
            }
        };
        let start = Instant::now();
        oracle::gap(&poly);
        let oracle_ms = start.elapsed().as_secs_f64() * 1_000.0;
        let timings: Vec<String> = BackendKind::ALL
            .iter()
            .map(|kind| {
                let backend = kind.build();
                let start = Instant::now();
                match evaluate_gap(backend.as_ref(), &poly) {
                    Ok(_) => format!("{:>14.3}", start.elapsed().as_secs_f64() * 1_000.0),
                    Err(_) => format!("{:>14}", "-"),
                }
            })
            .collect();
        println!("{vars:>5} | {oracle_ms:>12.3} | {}", timings.join(" | "));
    }
}
