// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sqk_core::test_support::sortie;

#[test]
fn topo_order_puts_dependencies_first() {
    let sorties = vec![
        sortie("srt-c", "C").files(&["c.rs"]).depends_on(&["srt-b"]).build(),
        sortie("srt-b", "B").files(&["b.rs"]).depends_on(&["srt-a"]).build(),
        sortie("srt-a", "A").files(&["a.rs"]).build(),
    ];

    let analysis = resolve(&sorties);

    let pos = |id: &str| analysis.topo_order.iter().position(|s| s.as_str() == id).unwrap();
    assert!(pos("srt-a") < pos("srt-b"));
    assert!(pos("srt-b") < pos("srt-c"));
}

#[test]
fn independent_sorties_share_a_group() {
    let sorties = vec![
        sortie("srt-a", "A").files(&["a.rs"]).build(),
        sortie("srt-b", "B").files(&["b.rs"]).build(),
        sortie("srt-c", "C").files(&["c.rs"]).depends_on(&["srt-a"]).build(),
    ];

    let analysis = resolve(&sorties);

    assert_eq!(analysis.parallel_groups.len(), 2);
    assert_eq!(analysis.parallel_groups[0].len(), 2);
    assert_eq!(analysis.parallel_groups[1], vec![sqk_core::SortieId::from_string("srt-c")]);
}

#[test]
fn file_overlap_forces_separate_groups() {
    // No dependency, but a shared file keeps them sequential
    let sorties = vec![
        sortie("srt-a", "A").files(&["shared.rs"]).depends_on(&["srt-root"]).build(),
        sortie("srt-b", "B").files(&["shared.rs"]).depends_on(&["srt-root"]).build(),
        sortie("srt-root", "Root").files(&["root.rs"]).build(),
    ];

    let analysis = resolve(&sorties);

    let group_of = |id: &str| {
        analysis
            .parallel_groups
            .iter()
            .position(|g| g.iter().any(|s| s.as_str() == id))
            .unwrap()
    };
    assert_ne!(group_of("srt-a"), group_of("srt-b"));
}

#[test]
fn critical_path_is_longest_chain() {
    let sorties = vec![
        sortie("srt-a", "A").files(&["a.rs"]).effort(1.0).build(),
        sortie("srt-b", "B").files(&["b.rs"]).effort(2.0).depends_on(&["srt-a"]).build(),
        sortie("srt-c", "C").files(&["c.rs"]).effort(4.0).depends_on(&["srt-b"]).build(),
        sortie("srt-d", "D").files(&["d.rs"]).effort(1.0).build(),
    ];

    let analysis = resolve(&sorties);

    let path: Vec<&str> = analysis.critical_path.iter().map(|s| s.as_str()).collect();
    assert_eq!(path, vec!["srt-a", "srt-b", "srt-c"]);
    assert_eq!(analysis.max_depth, 3);
    assert_eq!(analysis.critical_path_effort_hours, 7.0);
    assert_eq!(analysis.estimated_duration_ms, 7 * 3_600_000);
}

#[test]
fn single_sortie_analysis() {
    let sorties = vec![sortie("srt-a", "A").files(&["a.rs"]).effort(2.0).build()];

    let analysis = resolve(&sorties);

    assert_eq!(analysis.parallel_groups, vec![vec![sqk_core::SortieId::from_string("srt-a")]]);
    assert_eq!(analysis.critical_path.len(), 1);
    assert_eq!(analysis.max_depth, 1);
    assert!(analysis.cycles.is_empty());
}

#[test]
fn cycles_surface_defensively() {
    let sorties = vec![
        sortie("srt-a", "A").files(&["a.rs"]).depends_on(&["srt-b"]).build(),
        sortie("srt-b", "B").files(&["b.rs"]).depends_on(&["srt-a"]).build(),
    ];

    let analysis = resolve(&sorties);
    assert!(!analysis.cycles.is_empty());
}
