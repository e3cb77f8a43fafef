//! Feature listing for `inspect-model`.

use restock::features::describe_features;
use restock::features::registry::count_by_source;
use std::fmt::Write;

/// One line per feature with its source and meaning, then a tally by source.
pub(crate) fn feature_report(names: &[String]) -> String {
    let infos = describe_features(names);
    let mut out = String::new();

    let _ = writeln!(out, "Features ({}):", infos.len());
    for (i, info) in infos.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>3}  {:<28} {:<13} {}",
            i,
            info.name,
            info.source.label(),
            info.description
        );
    }

    let mut tally: Vec<_> = count_by_source(&infos).into_iter().collect();
    tally.sort_unstable();
    let _ = writeln!(out, "By source:");
    for (label, count) in tally {
        let _ = writeln!(out, "  {:<13} {}", label, count);
    }
    out
}
