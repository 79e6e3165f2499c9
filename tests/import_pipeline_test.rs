// ==========================================
// 导入管道集成测试（纯阶段,不经远端）
// ==========================================
// 测试目标: 列映射 → 名册比对 → 预检汇总 的端到端性质
// ==========================================

mod test_helpers;

use roster_import::config::ImportPolicy;
use roster_import::domain::import::{ColumnMapping, MappingTarget, ProblemKind, UploadedRow};
use roster_import::domain::person::PersonField;
use roster_import::domain::types::RecordAction;
use roster_import::importer::{
    ColumnMapper, ColumnMapperImpl, PreflightBuilder, PreflightBuilderImpl, RosterDiffer,
    RosterDifferImpl,
};
use std::collections::HashSet;
use test_helpers::existing;

fn row(row_number: usize, cells: &[&str]) -> UploadedRow {
    UploadedRow {
        row_number,
        cells: cells.iter().map(|c| c.to_string()).collect(),
    }
}

fn field_mapping(column: usize, field: PersonField) -> ColumnMapping {
    ColumnMapping {
        column,
        target: MappingTarget::Field { field },
        transform: None,
    }
}

/// 全管道便捷执行: 行 + 映射 + 远端名册 → (汇总, 问题清单)
fn run_pipeline(
    rows: &[UploadedRow],
    mappings: &[ColumnMapping],
    roster: &[roster_import::ExistingRecord],
    valid_tags: &[i64],
    valid_orgs: &[i64],
) -> (
    roster_import::PreflightSummary,
    Vec<roster_import::ValidationProblem>,
) {
    let policy = ImportPolicy::default();
    let mapper = ColumnMapperImpl::new(policy.clone());
    let builder = PreflightBuilderImpl::new(policy);

    let resolved = mapper.resolve(rows, mappings).expect("列映射应成功");
    let outcome = RosterDifferImpl.diff(&resolved.records, roster, PersonField::Email);

    let valid_tags: HashSet<i64> = valid_tags.iter().copied().collect();
    let valid_orgs: HashSet<i64> = valid_orgs.iter().copied().collect();
    let (summary, mut problems) =
        builder.build(&outcome, &resolved.records, &valid_tags, &valid_orgs);

    let mut all = resolved.problems;
    all.append(&mut problems);
    (summary, all)
}

#[test]
fn test_new_person_classifies_create() {
    let rows = vec![row(1, &["a@x.com", "Ann"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];

    let (summary, problems) = run_pipeline(&rows, &mappings, &[], &[], &[]);

    assert_eq!(summary.people_created.total, 1);
    assert_eq!(summary.people_updated.total, 0);
    assert_eq!(summary.people_no_change, 0);
    assert!(problems.is_empty());
}

#[test]
fn test_changed_name_classifies_update_with_triple() {
    let rows = vec![row(1, &["a@x.com", "Annie"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];
    let roster = vec![existing(
        10,
        &[
            (PersonField::Email, "a@x.com"),
            (PersonField::FirstName, "Ann"),
        ],
    )];

    let policy = ImportPolicy::default();
    let mapper = ColumnMapperImpl::new(policy.clone());
    let resolved = mapper.resolve(&rows, &mappings).unwrap();
    let outcome = RosterDifferImpl.diff(&resolved.records, &roster, PersonField::Email);

    assert_eq!(outcome.diffs.len(), 1);
    assert_eq!(outcome.diffs[0].action, RecordAction::Update);
    assert_eq!(outcome.diffs[0].changes.len(), 1);
    let change = &outcome.diffs[0].changes[0];
    assert_eq!(change.field, PersonField::FirstName);
    assert_eq!(
        change.old,
        Some(roster_import::FieldValue::Text("Ann".to_string()))
    );
    assert_eq!(change.new, roster_import::FieldValue::Text("Annie".to_string()));

    let builder = PreflightBuilderImpl::new(policy);
    let (summary, _) = builder.build(&outcome, &resolved.records, &HashSet::new(), &HashSet::new());
    assert_eq!(summary.people_updated.total, 1);
    assert_eq!(
        summary
            .people_updated
            .by_changed_field
            .get(&PersonField::FirstName),
        Some(&1)
    );
}

#[test]
fn test_identical_data_classifies_no_change() {
    let rows = vec![row(1, &["a@x.com", "Ann"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];
    let roster = vec![existing(
        10,
        &[
            (PersonField::Email, "a@x.com"),
            (PersonField::FirstName, "Ann"),
        ],
    )];

    let (summary, problems) = run_pipeline(&rows, &mappings, &roster, &[], &[]);

    assert_eq!(summary.people_no_change, 1);
    assert_eq!(summary.people_created.total, 0);
    assert_eq!(summary.people_updated.total, 0);
    assert!(problems.is_empty());
}

#[test]
fn test_classification_totals_partition_diffs() {
    // 新建 + 更新 + 无变化混合
    let rows = vec![
        row(1, &["new@x.com", "Nils"]),
        row(2, &["upd@x.com", "Ulla-ny"]),
        row(3, &["same@x.com", "Sten"]),
    ];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];
    let roster = vec![
        existing(
            10,
            &[
                (PersonField::Email, "upd@x.com"),
                (PersonField::FirstName, "Ulla"),
            ],
        ),
        existing(
            11,
            &[
                (PersonField::Email, "same@x.com"),
                (PersonField::FirstName, "Sten"),
            ],
        ),
    ];

    let (summary, _) = run_pipeline(&rows, &mappings, &roster, &[], &[]);

    assert_eq!(
        summary.people_created.total + summary.people_updated.total + summary.people_no_change,
        3
    );
    assert_eq!(summary.people_created.total, 1);
    assert_eq!(summary.people_updated.total, 1);
    assert_eq!(summary.people_no_change, 1);
}

#[test]
fn test_pipeline_rerun_yields_identical_results() {
    let rows = vec![
        row(1, &["a@x.com", "Ann", "x"]),
        row(2, &["b@x.com", "Bo", ""]),
    ];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
        ColumnMapping {
            column: 2,
            target: MappingTarget::Tag { tag_id: 11 },
            transform: None,
        },
    ];
    let roster = vec![existing(10, &[(PersonField::Email, "b@x.com")])];

    let first = run_pipeline(&rows, &mappings, &roster, &[11], &[]);
    let second = run_pipeline(&rows, &mappings, &roster, &[11], &[]);

    assert_eq!(first, second);
}

#[test]
fn test_duplicate_existing_emails_flag_ambiguity() {
    let rows = vec![row(1, &["dup@x.com", "Doris"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];
    let roster = vec![
        existing(10, &[(PersonField::Email, "dup@x.com")]),
        existing(11, &[(PersonField::Email, "dup@x.com")]),
    ];

    let (_, problems) = run_pipeline(&rows, &mappings, &roster, &[], &[]);

    let ambiguous: Vec<_> = problems
        .iter()
        .filter(|p| p.kind == ProblemKind::AmbiguousMatch)
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert!(ambiguous[0].blocks_commit());
}

#[test]
fn test_unknown_tag_reference_reported() {
    let rows = vec![row(1, &["a@x.com", "x"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        ColumnMapping {
            column: 1,
            target: MappingTarget::Tag { tag_id: 99 },
            transform: None,
        },
    ];

    // 合法标签集不含 99
    let (_, problems) = run_pipeline(&rows, &mappings, &[], &[11], &[]);

    assert!(problems
        .iter()
        .any(|p| p.kind == ProblemKind::UnknownTag && p.blocks_commit()));
}

#[test]
fn test_membership_and_tag_histograms() {
    let rows = vec![
        row(1, &["a@x.com", "1", "1"]),
        row(2, &["b@x.com", "1", ""]),
    ];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        ColumnMapping {
            column: 1,
            target: MappingTarget::Tag { tag_id: 11 },
            transform: None,
        },
        ColumnMapping {
            column: 2,
            target: MappingTarget::Org { org_id: 7 },
            transform: None,
        },
    ];

    let (summary, problems) = run_pipeline(&rows, &mappings, &[], &[11], &[7]);

    assert_eq!(summary.tagged.total, 2);
    assert_eq!(summary.tagged.by_tag.get(&11), Some(&2));
    assert_eq!(summary.added_to_org.total, 1);
    assert_eq!(summary.added_to_org.by_org.get(&7), Some(&1));
    assert!(problems.is_empty());
}

#[test]
fn test_incomplete_rows_surface_as_problem_not_dropped() {
    // 第 2 行只有名,不满足身份规则
    let rows = vec![row(1, &["a@x.com", "Ann"]), row(2, &["", "Berit"])];
    let mappings = vec![
        field_mapping(0, PersonField::Email),
        field_mapping(1, PersonField::FirstName),
    ];

    let (summary, problems) = run_pipeline(&rows, &mappings, &[], &[], &[]);

    // 两行都进入比对（第 2 行保留,不静默丢弃）
    assert_eq!(summary.people_created.total, 2);
    let missing: Vec<_> = problems
        .iter()
        .filter(|p| p.kind == ProblemKind::MissingIdentity)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].rows, vec![2]);
}
