use stuckat::atpg::{find_pattern, generate_test_patterns, AtpgConfig, FaultList, FaultStatus};
use stuckat::io::{read_bench, read_patterns, write_patterns};
use stuckat::sat::{Combination, Outcome, Solver};
use stuckat::sim::{detects, simulate_patterns};
use stuckat::{FaultSite, FaultyValue, Logic, Value};

const C17: &str = "# c17
# 5 inputs
# 2 outputs
# 0 inverters
# 6 gates ( 6 NANDs )

INPUT(1)
INPUT(2)
INPUT(3)
INPUT(6)
INPUT(7)

OUTPUT(22)
OUTPUT(23)

10 = NAND(1, 3)
11 = NAND(3, 6)
16 = NAND(2, 11)
19 = NAND(11, 7)
22 = NAND(10, 16)
23 = NAND(16, 19)
";

fn known_value(v: &FaultyValue) -> Option<bool> {
    if v.is_unknown() {
        None
    } else {
        Some(v.good().magnitude() & 1 != 0)
    }
}

#[test]
fn read_and_simulate() {
    let mut c = read_bench::<Value, _>(C17.as_bytes()).unwrap();
    assert_eq!(c.nb_inputs(), 5);
    assert_eq!(c.nb_outputs(), 2);
    let patterns = read_patterns("1: 00000\n2: 11111\n3: 10101\n".as_bytes()).unwrap();
    let outputs = simulate_patterns(&mut c, &patterns).unwrap();
    let mut buf = Vec::new();
    write_patterns(&mut buf, &outputs).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "1: 00\n2: 10\n3: 11\n");
}

#[test]
fn every_checkpoint_is_testable() {
    let mut c = read_bench::<FaultyValue, _>(C17.as_bytes()).unwrap();
    let solver = Solver::default();
    let sites = FaultSite::checkpoints(&c);
    assert_eq!(sites.len(), 22);
    for site in sites {
        let outcome = find_pattern(&mut c, site, &solver).unwrap();
        let Outcome::Satisfied(pattern) = outcome else {
            panic!("No pattern for {}", site.describe(&c));
        };
        // Inputs left at X can take any value
        for fill in [false, true] {
            let filled: Vec<bool> = pattern
                .iter()
                .map(|v| known_value(v).unwrap_or(fill))
                .collect();
            assert!(
                detects(&mut c, &filled, site).unwrap(),
                "Pattern does not detect {}",
                site.describe(&c)
            );
        }
    }
    for id in c.ids() {
        assert!(c.value(id).is_unknown());
    }
}

#[test]
fn full_coverage() {
    let mut c = read_bench::<FaultyValue, _>(C17.as_bytes()).unwrap();
    for fault_list in [FaultList::Checkpoints, FaultList::All] {
        let config = AtpgConfig {
            fault_list,
            compress: true,
            ..Default::default()
        };
        let report = generate_test_patterns(&mut c, &config).unwrap();
        assert!(report
            .status
            .iter()
            .all(|s| *s == FaultStatus::Detected));
        assert_eq!(report.coverage(), 100.0);
        for site in FaultSite::all(&c) {
            let detected = report
                .patterns
                .iter()
                .any(|p| detects(&mut c, p, site).unwrap());
            assert!(detected, "{} is not detected", site.describe(&c));
        }
    }
}

#[test]
fn node_combinations() {
    let mut c = read_bench::<Value, _>(C17.as_bytes()).unwrap();
    let solver = Solver::default();
    for name in ["10", "11", "16", "19", "22", "23"] {
        let node = c.find(name).unwrap();
        let mut combinations = Combination::all_node_combinations(&mut c, node).unwrap();
        assert_eq!(combinations.len(), 4);
        for comb in &mut combinations {
            assert!(solver.satisfy(&mut c, comb).unwrap());
        }
        for comb in combinations {
            comb.release(&mut c);
        }
    }
}
