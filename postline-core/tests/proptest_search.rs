use chrono::NaiveDate;
use postline_core::SearchFilter;
use proptest::prelude::*;

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (1900i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_username() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_.]{0,20}"
}

proptest! {
    /// Property: parsing never panics on arbitrary input
    #[test]
    fn prop_parse_never_panics(input in ".*") {
        let filter = SearchFilter::parse(&input);
        let today = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        // resolution may report out-of-range arithmetic but must not panic
        let _ = filter.resolve(today);
    }

    /// Property: a resolved range is always ordered ascending
    #[test]
    fn prop_range_is_ascending(date in arb_date(), days in -5000i64..5000) {
        let filter = SearchFilter::parse(&format!("{}/{}", date, days));
        let today = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        let range = filter.date_range(today).unwrap().unwrap();

        prop_assert!(range.from <= range.to);
        prop_assert_eq!(range.len_days(), days.abs());
        if days < 0 {
            prop_assert_eq!(range.to, date);
        } else {
            prop_assert_eq!(range.from, date);
        }
    }

    /// Property: username/date/days survive a render-then-parse trip
    #[test]
    fn prop_full_filter_is_recovered(name in arb_username(), date in arb_date(), days in any::<i32>()) {
        let rendered = format!("/{}/{}/{}", name, date, days);
        let filter = SearchFilter::parse(&rendered);

        prop_assert_eq!(filter.username.as_deref(), Some(name.as_str()));
        prop_assert_eq!(filter.from_date, Some(date));
        prop_assert_eq!(filter.days, Some(i64::from(days)));
    }

    /// Property: a bare name without date or days never filters
    #[test]
    fn prop_bare_name_is_dropped(name in arb_username()) {
        let filter = SearchFilter::parse(&name);
        prop_assert_eq!(filter, SearchFilter::default());
    }
}
