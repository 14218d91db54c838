//! Evaluate the [`PerceptronPredictor`] against some synthetic branch streams.

use perceptron_bp::*;
use perceptron_bp::config::PerceptronConfig;
use perceptron_bp::stats::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// A single dynamic instruction in a synthetic stream.
#[derive(Clone, Copy, Debug)]
enum Inst {
    Branch { pc: u32, tgt: u32, outcome: Outcome },
    Other { pc: u32, kind: OpKind },
}

/// A branch that is taken with some fixed probability.
fn biased(rng: &mut StdRng, len: usize) -> Vec<Inst> {
    (0..len).map(|_| Inst::Branch {
        pc: 0x0040_1000, tgt: 0x0040_1040,
        outcome: rng.gen_bool(0.9).into(),
    }).collect()
}

/// A loop with a fixed trip count, separated by some filler instructions.
fn periodic(_rng: &mut StdRng, len: usize) -> Vec<Inst> {
    let trip_count = 7;
    let mut res = Vec::new();
    for i in 0..len {
        res.push(Inst::Other { pc: 0x0040_2000, kind: OpKind::Load });
        res.push(Inst::Branch {
            pc: 0x0040_2004, tgt: 0x0040_2000,
            outcome: (i % trip_count != trip_count - 1).into(),
        });
    }
    res
}

/// A random branch followed by a branch that repeats its outcome.
fn correlated(rng: &mut StdRng, len: usize) -> Vec<Inst> {
    let mut res = Vec::new();
    for _ in 0..len / 2 {
        let outcome: Outcome = rng.gen_bool(0.5).into();
        res.push(Inst::Branch { pc: 0x0040_3000, tgt: 0x0040_3010, outcome });
        res.push(Inst::Other { pc: 0x0040_3004, kind: OpKind::DirectCall });
        res.push(Inst::Other { pc: 0x0040_4000, kind: OpKind::Return });
        res.push(Inst::Branch { pc: 0x0040_3008, tgt: 0x0040_3020, outcome });
    }
    res
}

/// Many branches with random outcomes.
fn random(rng: &mut StdRng, len: usize) -> Vec<Inst> {
    (0..len).map(|_| Inst::Branch {
        pc: 0x0040_0000 | (rng.gen_range(0..256u32) << 2),
        tgt: 0,
        outcome: rng.gen_bool(0.5).into(),
    }).collect()
}

fn run_test(name: &str, stream: &[Inst]) {
    let mut p = PerceptronConfig::default().build();
    let mut stat = PredictorStats::new();

    for inst in stream {
        match *inst {
            Inst::Branch { pc, tgt, outcome } => {
                let pred = p.predict(pc);
                p.update(pc, outcome.into(), pred, tgt);
                stat.record(pc, pred.into(), outcome);
            },
            Inst::Other { pc, kind } => {
                p.track_other_inst(pc, kind, 0);
                stat.record_other(kind);
            },
        }
    }

    info!(name, threshold = p.threshold(), "finished stream");
    println!("  {:12} Global hit rate: {}/{} ({:.2}% correct) ({} misses, {:.2} MPKI)",
        name,
        stat.global_hits(),
        stat.global_brns(),
        stat.hit_rate() * 100.0,
        stat.global_miss(),
        stat.mpki(),
    );
    println!("  {:12} {} branches ({} always taken, {} never taken), {} other control-flow",
        "",
        stat.num_unique_branches(),
        stat.num_always_taken(),
        stat.num_never_taken(),
        stat.global_other_ctrl,
    );
    for (pc, data) in stat.get_low_rate_branches(3, 0.75) {
        println!("    {:08x}: {}/{} hits", pc, data.hits, data.occ);
    }
}

/// Build a log filter from some directives, or from `RUST_LOG` when none are
/// given. Anything left unspecified is logged at the 'warn' level.
fn env_filter(directives: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into());
    match directives {
        Some(dirs) => builder.parse_lossy(dirs),
        None => builder.from_env_lossy(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(None))
        .init();

    let cfg = PerceptronConfig::default();
    println!("[*] {} ({} bytes of state)",
        PerceptronPredictor::new().name(), cfg.storage_bytes());

    let streams: [(&str, fn(&mut StdRng, usize) -> Vec<Inst>); 4] = [
        ("biased", biased),
        ("periodic", periodic),
        ("correlated", correlated),
        ("random", random),
    ];
    for (name, make_stream) in streams {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let stream = make_stream(&mut rng, 100_000);
        run_test(name, &stream);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn log_filter_defaults_to_warn() {
        assert_eq!(env_filter(Some("")).max_level_hint(),
            Some(LevelFilter::WARN));
    }

    #[test]
    fn log_filter_honors_directives() {
        assert_eq!(env_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG));
        assert_eq!(env_filter(Some("perceptron_bp=trace")).max_level_hint(),
            Some(LevelFilter::TRACE));
    }
}
