// Copyright 2020 Johannes Köster.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios: VCF text in, reconstructed derivative
//! chromosomes out.

use karyograph::{
    classify, derive, parse_vcf_str, reconstruct, Chain, DeriveOptions, Orientation, SvClass,
};

fn segments(chain: &Chain) -> Vec<(usize, Orientation)> {
    chain
        .segments
        .iter()
        .map(|s| (s.ref_index.unwrap(), s.orientation))
        .collect()
}

const DELETION_VCF: &str = "\
chr1\t1000\ta\tN\tA[chr1:2000[\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\t]chr1:1000]C\t.\t.\tSVTYPE=BND;MATEID=a
";

#[test]
fn deletion_walk() {
    let breakends = parse_vcf_str(DELETION_VCF).unwrap();
    let result = reconstruct(breakends);

    let coords: Vec<(u64, u64)> = result.ref_segments.iter().map(|s| (s.start, s.end)).collect();
    assert_eq!(coords, vec![(0, 1000), (1000, 2000), (2000, 3000)]);

    assert_eq!(result.chains.len(), 1);
    assert_eq!(
        segments(&result.chains[0]),
        vec![(0, Orientation::Forward), (2, Orientation::Forward)]
    );
    assert_eq!(result.orphan_indices, vec![1]);
    assert_eq!(classify(&result.chains[0]), SvClass::Deletion);
}

#[test]
fn deletion_chaining() {
    let breakends = parse_vcf_str(DELETION_VCF).unwrap();
    let result = derive(breakends, &DeriveOptions::default());

    // A single junction: one chain with no spliced segments, open ends
    // at the two mates.
    assert_eq!(result.chains.len(), 1);
    let chain = &result.chains[0];
    assert!(chain.is_empty());
    let ids: Vec<_> = chain.ends.iter().map(|e| e.id.clone().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(classify(chain), SvClass::Deletion);

    // Mate linkage puts both breakends into one cluster.
    assert_eq!(result.clusters, vec![vec!["a".to_owned(), "b".to_owned()]]);
}

#[test]
fn inversion_walk() {
    let vcf = "\
chr1\t1000\ta\tN\tA]chr1:2000]\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\tC]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=a
chr1\t1000\tc\tN\t]chr1:2000]A\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t2000\td\tN\t]chr1:1000]C\t.\t.\tSVTYPE=BND;MATEID=c
";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = reconstruct(breakends);

    assert_eq!(result.chains.len(), 1);
    assert_eq!(
        segments(&result.chains[0]),
        vec![
            (0, Orientation::Forward),
            (1, Orientation::Reverse),
            (2, Orientation::Forward)
        ]
    );
    assert!(result.orphan_indices.is_empty());
    assert_eq!(classify(&result.chains[0]), SvClass::Inversion);
}

#[test]
fn balanced_translocation_walk() {
    let vcf = "\
chr1\t1000\ta\tN\tN[chr2:3000[\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t1000\tb\tN\t]chr2:3000]N\t.\t.\tSVTYPE=BND;MATEID=c
chr2\t3000\tc\tN\tN]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=b
chr2\t3000\td\tN\t[chr1:1000[N\t.\t.\tSVTYPE=BND;MATEID=a
";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = reconstruct(breakends);

    // Segments: chr1 = {0: [0, 1000), 1: [1000, 2000)},
    //           chr2 = {2: [0, 3000), 3: [3000, 4000)}.
    assert_eq!(result.ref_segments.len(), 4);
    assert_eq!(result.chains.len(), 2);
    assert_eq!(
        segments(&result.chains[0]),
        vec![(0, Orientation::Forward), (3, Orientation::Forward)]
    );
    assert_eq!(
        segments(&result.chains[1]),
        vec![(2, Orientation::Forward), (1, Orientation::Forward)]
    );
    assert!(result.orphan_indices.is_empty());
    assert_eq!(classify(&result.chains[0]), SvClass::Translocation);
    assert_eq!(classify(&result.chains[1]), SvClass::Translocation);
}

#[test]
fn unbalanced_translocation_walk() {
    let vcf = "\
chr1\t1000\ta\tN\tN[chr2:3000[\t.\t.\tSVTYPE=BND;MATEID=b
chr2\t3000\tb\tN\t[chr1:1000[N\t.\t.\tSVTYPE=BND;MATEID=a
";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = reconstruct(breakends);

    // One chain joins a chr1 side to a chr2 side; the remaining stub
    // segments come out as open singletons.
    assert_eq!(result.chains.len(), 3);
    assert_eq!(
        segments(&result.chains[0]),
        vec![(0, Orientation::Forward), (3, Orientation::Forward)]
    );
    assert_eq!(segments(&result.chains[1]), vec![(2, Orientation::Forward)]);
    assert_eq!(segments(&result.chains[2]), vec![(1, Orientation::Reverse)]);
    assert!(result.orphan_indices.is_empty());
}

#[test]
fn tandem_duplication_closed_loop() {
    // Back-facing pair (Left at 1000, Right at 2000) plus an unpaired
    // third breakend; the spanned segment closes onto itself.
    let vcf = "\
chr1\t1000\ta\tN\t]chr1:2000]N\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\tN]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=a
chr1\t2000\tc\tN\tN[chr9:99999[\t.\t.\tSVTYPE=BND;MATEID=zz
";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = reconstruct(breakends);

    let (closed, open): (Vec<&Chain>, Vec<&Chain>) =
        result.chains.iter().partition(|c| c.is_closed);
    assert_eq!(closed.len(), 1);
    assert_eq!(segments(closed[0]), vec![(1, Orientation::Forward)]);
    let open_segments: Vec<_> = open.iter().map(|c| segments(c)).collect();
    assert_eq!(
        open_segments,
        vec![
            vec![(0, Orientation::Forward)],
            vec![(2, Orientation::Reverse)]
        ]
    );
    assert!(result.orphan_indices.is_empty());
}

#[test]
fn inversion_chaining_splices_via_ti_edge() {
    let vcf = "\
chr1\t1000\ta\tN\tA]chr1:2000]\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\tC]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=a
chr1\t1000\tc\tN\t]chr1:2000]A\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t2000\td\tN\t]chr1:1000]C\t.\t.\tSVTYPE=BND;MATEID=c
";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = derive(breakends, &DeriveOptions::default());

    // The two seeded junction chains merge across the single TI edge
    // (c Left @ 1000, b Right @ 2000).
    assert_eq!(result.chains.len(), 1);
    let chain = &result.chains[0];
    assert_eq!(chain.segments.len(), 1);
    assert_eq!((chain.segments[0].start, chain.segments[0].end), (1000, 2000));
    let mut ids: Vec<_> = chain.ends.iter().map(|e| e.id.clone().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "d"]);
}

#[test]
fn cn_filter_prunes_ti_edges() {
    let vcf = "\
chr1\t1000\ta\tN\tA]chr1:2000]\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\tC]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=a
chr1\t1000\tc\tN\t]chr1:2000]A\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t2000\td\tN\t]chr1:1000]C\t.\t.\tSVTYPE=BND;MATEID=c
";
    let breakends = parse_vcf_str(vcf).unwrap();

    // The interval spanned by the only TI edge sits at background
    // ploidy: the edge is dropped and no splice happens.
    let options = DeriveOptions {
        cn_segments: Some(vec![karyograph::CnSegmentBuilder::default()
            .contig("chr1")
            .start(0)
            .end(3000)
            .major_cn(1.0)
            .minor_cn(1.0)
            .build()
            .unwrap()]),
        ..DeriveOptions::default()
    };
    let result = derive(breakends, &options);
    assert_eq!(result.chains.len(), 2);
    assert!(result.chains.iter().all(|c| c.is_empty()));
}

#[test]
fn results_are_deterministic_and_idempotent() {
    let vcf = "\
chr1\t1000\ta\tN\tN[chr2:3000[\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t1000\tb\tN\t]chr2:3000]N\t.\t.\tSVTYPE=BND;MATEID=c
chr2\t3000\tc\tN\tN]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=b
chr2\t3000\td\tN\t[chr1:1000[N\t.\t.\tSVTYPE=BND;MATEID=a
";
    let first = reconstruct(parse_vcf_str(vcf).unwrap());
    let second = reconstruct(parse_vcf_str(vcf).unwrap());
    assert_eq!(first, second);

    // Input order is irrelevant.
    let mut shuffled = parse_vcf_str(vcf).unwrap();
    shuffled.reverse();
    assert_eq!(first, reconstruct(shuffled));

    let derived_first = derive(parse_vcf_str(vcf).unwrap(), &DeriveOptions::default());
    let derived_second = derive(parse_vcf_str(vcf).unwrap(), &DeriveOptions::default());
    assert_eq!(derived_first, derived_second);
}

#[test]
fn dangling_mate_ids_are_tolerated() {
    let vcf = "chr1\t1000\ta\tN\tA[chr1:2000[\t.\t.\tSVTYPE=BND;MATEID=ghost\n";
    let breakends = parse_vcf_str(vcf).unwrap();
    let result = reconstruct(breakends);

    // The severed port has no resolvable mate and stays an open end.
    assert_eq!(result.chains.len(), 2);
    let walked: usize = result.chains.iter().map(|c| c.segments.len()).sum();
    assert_eq!(walked + result.orphan_indices.len(), result.ref_segments.len());
}

#[test]
fn forward_segments_keep_start_below_end() {
    let vcf = "\
chr1\t1000\ta\tN\tA]chr1:2000]\t.\t.\tSVTYPE=BND;MATEID=b
chr1\t2000\tb\tN\tC]chr1:1000]\t.\t.\tSVTYPE=BND;MATEID=a
chr1\t1000\tc\tN\t]chr1:2000]A\t.\t.\tSVTYPE=BND;MATEID=d
chr1\t2000\td\tN\t]chr1:1000]C\t.\t.\tSVTYPE=BND;MATEID=c
";
    let result = reconstruct(parse_vcf_str(vcf).unwrap());
    for chain in &result.chains {
        for segment in &chain.segments {
            assert!(segment.start < segment.end);
        }
    }
}
