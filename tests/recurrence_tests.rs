use chore_rota::recurrence::RuleError;
use chore_rota::{RecurrenceRule, WeekIndex};

fn wk(week: u32, year: i32) -> WeekIndex {
    WeekIndex::new(week, year).unwrap()
}

#[test]
fn weekly_rule_covers_whole_year() {
    let rule = RecurrenceRule::periodic(0, 1, 0).unwrap();
    assert!(rule.is_due(wk(1, 2025)));
    assert!(rule.is_due(wk(52, 2025)));
}

#[test]
fn biweekly_monday_rule_in_early_2025() {
    let rule: RecurrenceRule = "Once per 2 weeks on Monday.".parse().unwrap();
    assert!(!rule.is_due(wk(1, 2025)));
    assert!(rule.is_due(wk(2, 2025)));
    assert!(!rule.is_due(wk(3, 2025)));
}

#[test]
fn text_round_trip_over_many_weeks() {
    let rules = [
        "Once per week.",
        "Once per 3 weeks on Friday with offset 2.",
        "Once per 2 weeks on Sunday with offset 1.",
        "Weeks on Wednesday in 2025: 1 9 52; in 2026: 1 53.",
    ];
    for text in rules {
        let rule: RecurrenceRule = text.parse().unwrap();
        let reparsed: RecurrenceRule = rule.to_string().parse().unwrap();
        let mut week = wk(1, 2025);
        for _ in 0..210 {
            assert_eq!(rule.is_due(week), reparsed.is_due(week), "{text} at {week}");
            week = week.next();
        }
    }
}

#[test]
fn week_53_only_exists_in_long_years() {
    // 2026 has 53 ISO weeks, 2025 only 52.
    assert!("Weeks in 2026: 53".parse::<RecurrenceRule>().is_ok());
    assert!(matches!(
        "Weeks in 2025: 53".parse::<RecurrenceRule>(),
        Err(RuleError::Week(_))
    ));
}

#[test]
fn next_due_week_crosses_year_end() {
    let rule: RecurrenceRule = "Weeks on Monday in 2025: 50; in 2026: 2".parse().unwrap();
    assert_eq!(rule.next_due_on_or_after(wk(51, 2025), 10), Some(wk(2, 2026)));
    assert_eq!(rule.next_due_on_or_after(wk(3, 2026), 10), None);
}
