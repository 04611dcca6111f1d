//! norm-lint: sanity-check norm snapshots before they are published
//!
//! Usage:
//!   norm-lint <snapshot.json>            # validate one snapshot
//!   norm-lint <old.json> <new.json>      # diff two snapshots
//!   norm-lint <old.json> <new.json> -q   # quiet: exit 0 if same, 1 if different
//!
//! Validation catches the calibration errors the scoring engine would
//! otherwise have to degrade around: nonpositive std devs, blank categories,
//! duplicate (scope, category) rows. Run in the calibration workflow before
//! replacing the active snapshot.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::process;

#[derive(serde::Deserialize)]
struct Snapshot {
    version: String,
    norms: Vec<NormRow>,
}

#[derive(serde::Deserialize, Clone)]
struct NormRow {
    category: String,
    #[serde(default)]
    scope: Option<String>,
    mean: f64,
    std_dev: f64,
}

/// (scope, canonical category) -> (mean, std_dev)
type NormMap = BTreeMap<(String, String), (f64, f64)>;

fn load_snapshot(path: &str) -> Snapshot {
    let contents = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("norm-lint: cannot read {}: {}", path, e);
        process::exit(2);
    });
    serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("norm-lint: invalid JSON in {}: {}", path, e);
        process::exit(2);
    })
}

/// Mirror of the engine's canonical form: trim, strip legacy prefix, lowercase.
fn canonical(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    let stripped = ["scale_", "comp_", "competency_", "total_"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower);
    stripped.trim().to_string()
}

fn scope_of(row: &NormRow) -> String {
    if let Some(scope) = &row.scope {
        return scope.trim().to_ascii_lowercase();
    }
    let lower = row.category.trim().to_ascii_lowercase();
    if lower == "total" || lower.starts_with("total_") {
        "total".to_string()
    } else if lower.starts_with("comp_") || lower.starts_with("competency_") {
        "competency".to_string()
    } else {
        "scale".to_string()
    }
}

fn validate(snapshot: &Snapshot) -> Vec<String> {
    let mut findings = Vec::new();
    let mut seen: NormMap = BTreeMap::new();

    for row in &snapshot.norms {
        let scope = scope_of(row);
        let category = canonical(&row.category);
        if category.is_empty() {
            findings.push(format!("{}: blank category name", scope));
            continue;
        }
        if row.std_dev <= 0.0 {
            findings.push(format!(
                "{}/{}: std_dev {} is not positive (would yield T=50 for everyone)",
                scope, category, row.std_dev
            ));
        }
        if seen
            .insert((scope.clone(), category.clone()), (row.mean, row.std_dev))
            .is_some()
        {
            findings.push(format!("{}/{}: duplicate row", scope, category));
        }
    }

    findings
}

fn to_map(snapshot: &Snapshot) -> NormMap {
    let mut map = BTreeMap::new();
    for row in &snapshot.norms {
        map.entry((scope_of(row), canonical(&row.category)))
            .or_insert((row.mean, row.std_dev));
    }
    map
}

fn diff(map_a: &NormMap, map_b: &NormMap) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut only_a = Vec::new();
    let mut only_b = Vec::new();
    let mut changed = Vec::new();

    let all_keys: std::collections::BTreeSet<_> = map_a.keys().chain(map_b.keys()).collect();

    for key in all_keys {
        let label = format!("{}/{}", key.0, key.1);
        match (map_a.get(key), map_b.get(key)) {
            (Some(_), None) => only_a.push(label),
            (None, Some(_)) => only_b.push(label),
            (Some((mean_a, std_a)), Some((mean_b, std_b))) => {
                if mean_a != mean_b || std_a != std_b {
                    changed.push(format!(
                        "{}: mean {} -> {}, std_dev {} -> {}",
                        label, mean_a, mean_b, std_a, std_b
                    ));
                }
            }
            (None, None) => unreachable!(),
        }
    }
    (only_a, only_b, changed)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let quiet = args.iter().any(|a| a == "-q" || a == "--quiet");
    let files: Vec<_> = args.iter().filter(|a| !a.starts_with('-')).skip(1).collect();

    match files.len() {
        1 => {
            let snapshot = load_snapshot(files[0]);
            let findings = validate(&snapshot);
            if findings.is_empty() {
                if !quiet {
                    println!("{}: {} rows, no findings.", snapshot.version, snapshot.norms.len());
                }
                process::exit(0);
            }
            if !quiet {
                for f in &findings {
                    println!("! {}", f);
                }
            }
            process::exit(1);
        }
        2 => {
            let snap_a = load_snapshot(files[0]);
            let snap_b = load_snapshot(files[1]);
            let (only_a, only_b, changed) = diff(&to_map(&snap_a), &to_map(&snap_b));

            let has_diff = !only_a.is_empty() || !only_b.is_empty() || !changed.is_empty();
            if quiet {
                process::exit(if has_diff { 1 } else { 0 });
            }
            if !has_diff {
                println!("No differences.");
                process::exit(0);
            }

            for n in &only_a {
                println!("- {}", n);
            }
            for n in &only_b {
                println!("+ {}", n);
            }
            for c in &changed {
                println!("~ {}", c);
            }
            process::exit(1);
        }
        _ => {
            eprintln!("Usage: norm-lint <snapshot.json> [<other.json>] [-q|--quiet]");
            eprintln!("  one file: validate; two files: diff");
            eprintln!("  -q  Quiet: only exit code (0=clean/same, 1=findings/different)");
            process::exit(2);
        }
    }
}
