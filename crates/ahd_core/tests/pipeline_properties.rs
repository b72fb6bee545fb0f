use std::cmp::Ordering;
use std::collections::HashSet;

use proptest::prelude::*;
use proptest::sample::select;
use time::OffsetDateTime;

use ahd_core::domain::{
    environment_priority, Actionability, Category, Environment, Incident, Status,
};
use ahd_core::filter::{filter_incidents, FilterCriteria};
use ahd_core::group::{group_by_account, UNKNOWN_ACCOUNT_KEY};
use ahd_core::sort::{compare_incidents, sort_incidents};

fn arb_actionability() -> impl Strategy<Value = Actionability> {
    prop_oneof![
        Just(Actionability::ActionRequired),
        Just(Actionability::ActionMayBeRequired),
        Just(Actionability::Informational),
        Just(Actionability::Unknown),
    ]
}

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Issue),
        Just(Category::ScheduledChange),
        Just(Category::AccountNotification),
        Just(Category::Unknown),
    ]
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Open),
        Just(Status::Upcoming),
        Just(Status::Closed),
        Just(Status::Unknown),
    ]
}

fn arb_environment() -> impl Strategy<Value = Environment> {
    prop_oneof![
        Just(Environment::Prd),
        Just(Environment::Npr),
        Just(Environment::Dev),
        Just(Environment::Sandbox),
        Just(Environment::Unknown),
    ]
}

fn arb_text(choices: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    proptest::option::of(select(choices).prop_map(str::to_string))
}

fn arb_incident() -> impl Strategy<Value = Incident> {
    (
        arb_actionability(),
        arb_category(),
        arb_status(),
        proptest::option::of(arb_environment()),
        arb_text(&["EC2", "RDS", "S3", "LAMBDA"]),
        arb_text(&["us-east-1", "eu-west-1", "ap-southeast-1"]),
        arb_text(&["111122223333", "444455556666", ""]),
        proptest::option::of(1_600_000_000i64..1_800_000_000),
    )
        .prop_map(
            |(actionability, category, status, environment, service, region, account_id, ts)| {
                Incident {
                    id: String::new(),
                    arn: String::new(),
                    service,
                    event_type_code: None,
                    event_scope_code: None,
                    region,
                    availability_zone: None,
                    category,
                    actionability,
                    status,
                    environment,
                    account_id,
                    account_alias: None,
                    start_time: None,
                    end_time: None,
                    last_updated_time: ts.and_then(|t| OffsetDateTime::from_unix_timestamp(t).ok()),
                    title: "Operational issue".to_string(),
                    description: "AWS Health Event".to_string(),
                    affected_entities: Vec::new(),
                }
            },
        )
}

fn arb_incidents() -> impl Strategy<Value = Vec<Incident>> {
    prop::collection::vec(arb_incident(), 0..24).prop_map(|mut list| {
        for (i, inc) in list.iter_mut().enumerate() {
            inc.id = format!("inc-{i}");
            inc.arn = format!("arn:aws:health:global::event/inc-{i}");
        }
        list
    })
}

fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        arb_text(&["ec2", "EAST", "1111", "inc-3", "nomatch"]),
        arb_text(&["EC2", "RDS", "S3"]),
        arb_text(&["us-east-1", "eu-west-1"]),
        proptest::option::of(arb_category()),
        proptest::option::of(arb_actionability()),
        proptest::option::of(arb_environment()),
        proptest::option::of(arb_status()),
    )
        .prop_map(
            |(search, service, region, category, actionability, environment, status)| {
                FilterCriteria {
                    search,
                    service,
                    region,
                    category,
                    actionability,
                    environment,
                    status,
                }
            },
        )
}

/// Field-by-field restatement of the filter contract, independent of `FilterCriteria::matches`.
fn expected_match(inc: &Incident, c: &FilterCriteria) -> bool {
    let text_eq = |want: &Option<String>, have: &Option<String>| match want.as_deref() {
        None | Some("") => true,
        Some(w) => have.as_deref() == Some(w),
    };
    let enum_eq = |ok: bool, constrained: bool| !constrained || ok;

    let search_ok = match c.search.as_deref() {
        None | Some("") => true,
        Some(term) => {
            let term = term.to_lowercase();
            [
                Some(inc.title.as_str()),
                inc.service.as_deref(),
                inc.region.as_deref(),
                Some(inc.arn.as_str()),
                inc.account_alias.as_deref(),
                inc.account_id.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|f| f.to_lowercase().contains(&term))
        }
    };

    search_ok
        && text_eq(&c.service, &inc.service)
        && text_eq(&c.region, &inc.region)
        && enum_eq(c.category == Some(inc.category), c.category.is_some())
        && enum_eq(
            c.actionability == Some(inc.actionability),
            c.actionability.is_some(),
        )
        && enum_eq(
            c.environment.is_some() && c.environment == inc.environment,
            c.environment.is_some(),
        )
        && enum_eq(c.status == Some(inc.status), c.status.is_some())
}

fn ids(list: &[Incident]) -> Vec<String> {
    list.iter().map(|i| i.id.clone()).collect()
}

proptest! {
    #[test]
    fn filter_keeps_exactly_the_matching_records_in_order(
        incidents in arb_incidents(),
        criteria in arb_criteria(),
    ) {
        let out = filter_incidents(&incidents, &criteria);
        let expected: Vec<String> = incidents
            .iter()
            .filter(|i| expected_match(i, &criteria))
            .map(|i| i.id.clone())
            .collect();
        prop_assert_eq!(ids(&out), expected);
    }

    #[test]
    fn sort_is_an_ordered_permutation(incidents in arb_incidents()) {
        let sorted = sort_incidents(&incidents);

        let mut before = ids(&incidents);
        let mut after = ids(&sorted);
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);

        for pair in sorted.windows(2) {
            prop_assert_ne!(compare_incidents(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn sort_is_idempotent(incidents in arb_incidents()) {
        let once = sort_incidents(&incidents);
        let twice = sort_incidents(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn grouping_partitions_the_input(incidents in arb_incidents()) {
        let groups = group_by_account(&incidents);

        let mut seen: Vec<String> = groups.iter().flat_map(|g| ids(&g.incidents)).collect();
        let mut all = ids(&incidents);
        seen.sort();
        all.sort();
        prop_assert_eq!(seen, all);

        let keys: HashSet<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        prop_assert_eq!(keys.len(), groups.len());

        for g in &groups {
            prop_assert_eq!(g.summary.total(), g.incidents.len());
            for inc in &g.incidents {
                let key = inc
                    .account_id
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(UNKNOWN_ACCOUNT_KEY);
                prop_assert_eq!(key, g.key.as_str());
            }
        }

        for pair in groups.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.summary.action_required >= b.summary.action_required);
            if a.summary.action_required == b.summary.action_required {
                prop_assert!(
                    environment_priority(a.environment) <= environment_priority(b.environment),
                    "{} ({:?}) ranked before {} ({:?})",
                    a.key,
                    a.environment,
                    b.key,
                    b.environment
                );
            }
        }
    }

    #[test]
    fn group_members_keep_input_order(incidents in arb_incidents()) {
        let position = |id: &str| incidents.iter().position(|i| i.id == id);
        for g in group_by_account(&incidents) {
            let positions: Vec<_> = g.incidents.iter().map(|i| position(&i.id)).collect();
            let mut ordered = positions.clone();
            ordered.sort();
            prop_assert_eq!(positions, ordered);
        }
    }
}
