use flow_engine::{
    aggregate_by_strike, analyze, compute_momentum, load_project, merge_datasets, parse_csv,
    save_project, AnalysisParams, BucketWidth, Dataset, DatasetSelection, Metric, Signal,
    StrikeFilter, WindowLength,
};

const HEADER: &str = "date,time,symbol,expiry,strike,put_call,side,spot,size,price,premium\n";

fn csv(rows: &[&str]) -> String {
    let mut text = HEADER.to_string();
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

#[test]
fn strike_tiers_and_totals() {
    let records = parse_csv(&csv(&[
        "11/18/2025,09:30:00 AM,SPY,11/21/2025,650,call,ask,660.00,100,$5.00,$500K",
        "11/18/2025,09:31:00 AM,SPY,11/21/2025,650,call,ask,660.50,4000,$5.00,$2M",
        "11/18/2025,09:32:00 AM,SPY,11/21/2025,650,put,bid,661.00,200,$1.50,$300K",
    ]));

    let summary = aggregate_by_strike(&records, &StrikeFilter::default());
    assert_eq!(summary.aggregates.len(), 1);

    let strike = &summary.aggregates[0];
    assert_eq!(strike.strike, 650.0);
    assert_eq!(strike.call_premium_normal, 500_000.0);
    assert_eq!(strike.call_premium_whale, 2_000_000.0);
    assert_eq!(strike.put_premium_normal, -300_000.0);
    assert_eq!(strike.put_premium_whale, 0.0);
    // premium decides the tier for the size track too
    assert_eq!(strike.call_size_normal, 100.0);
    assert_eq!(strike.call_size_whale, 4000.0);
    assert_eq!(strike.put_size_normal, -200.0);

    assert_eq!(summary.totals.put_call_ratio(Metric::Premium), Some(0.12));
    assert_eq!(summary.latest_spot, Some(661.0));
    assert_eq!(summary.avg_spot, Some((660.0 + 660.5 + 661.0) / 3.0));
}

#[test]
fn merging_all_drops_repeated_exports() {
    let text = csv(&[
        "11/18/2025,09:30:00 AM,SPY,11/21/2025,650,call,ask,660.00,100,$5.00,$50K",
        "11/18/2025,09:31:00 AM,SPY,11/21/2025,655,put,bid,660.20,40,$2.00,$8K",
    ]);
    let later = csv(&[
        "11/18/2025,09:31:00 AM,SPY,11/21/2025,655,put,bid,660.20,40,$2.00,$8K",
        "11/18/2025,09:35:00 AM,SPY,11/21/2025,660,call,ask,660.40,10,$1.00,$1K",
    ]);

    let first = Dataset::from_csv("first", "first.csv", "9:40:00 AM", &text);
    let again = Dataset::from_csv("again", "again.csv", "9:41:00 AM", &text);
    let second = Dataset::from_csv("second", "second.csv", "9:42:00 AM", &later);

    let merged = merge_datasets(&[first.clone(), again, second], &DatasetSelection::All);
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[..2], first.records[..]);

    let single = merge_datasets(&[first.clone()], &DatasetSelection::All);
    let params = AnalysisParams::default();
    assert_eq!(
        analyze(&single, &params),
        analyze(&merge_datasets(&[first.clone(), first], &DatasetSelection::All), &params)
    );
}

#[test]
fn bucket_width_follows_span() {
    struct TestCase {
        last: &'static str,
        expected: BucketWidth,
    }

    let tests = vec![
        TestCase {
            // TC0: two hours
            last: "11/18/2025,11:30:00 AM",
            expected: BucketWidth::OneMinute,
        },
        TestCase {
            // TC1: two days
            last: "11/20/2025,09:30:00 AM",
            expected: BucketWidth::FifteenMinutes,
        },
        TestCase {
            // TC2: ten days
            last: "11/28/2025,09:30:00 AM",
            expected: BucketWidth::OneHour,
        },
    ];

    for (index, test) in tests.into_iter().enumerate() {
        let last = format!("{},SPY,12/19/2025,650,put,bid,660,10,$1.00,$2K", test.last);
        let records = parse_csv(&csv(&[
            "11/18/2025,09:30:00 AM,SPY,12/19/2025,650,call,ask,660,10,$1.00,$5K",
            &last,
        ]));
        let series = compute_momentum(&records, Metric::Premium, WindowLength::default());

        assert_eq!(series.len(), 2, "TC{} failed", index);
        assert!(series.iter().all(|p| p.width == test.expected), "TC{} failed", index);
        assert_eq!(series[1].cumulative, 3_000.0, "TC{} failed", index);
    }
}

#[test]
fn moving_average_and_crossovers() {
    let rows: Vec<String> = (0..6)
        .map(|minute| {
            let side = if minute % 2 == 0 { "call" } else { "put" };
            format!("11/18/2025,09:3{minute}:00 AM,SPY,11/21/2025,650,{side},ask,660,1,$100,$100")
        })
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    let records = parse_csv(&csv(&rows));

    let params = AnalysisParams {
        window: WindowLength::new(3).unwrap(),
        ..AnalysisParams::default()
    };
    let analysis = analyze(&records, &params);
    let series = &analysis.momentum;

    let cumulative: Vec<f64> = series.iter().map(|p| p.cumulative).collect();
    assert_eq!(cumulative, vec![100.0, 0.0, 100.0, 0.0, 100.0, 0.0]);

    assert!(series[..2].iter().all(|p| p.ma.is_none()));
    assert_eq!(series[2].ma, Some(200.0 / 3.0));
    assert_eq!(series[3].ma, Some(100.0 / 3.0));

    let signals: Vec<Option<Signal>> = series.iter().map(|p| p.signal).collect();
    assert_eq!(
        signals,
        vec![
            None,
            None,
            None,
            Some(Signal::Bearish),
            Some(Signal::Bullish),
            Some(Signal::Bearish),
        ]
    );
}

#[test]
fn project_file_round_trip() {
    let dataset = Dataset::from_csv(
        "spy",
        "spy.csv",
        "4:15:02 PM",
        &csv(&[
            "11/18/2025,04:14:50 PM,SPY,11/19/2025,659,call,ask,659.80,201,$4.13,$83K",
            "11/18/2025,04:14:57 PM,SPY,12/05/2025,640,put,ask,659.74,150,$5.71,$85.7K",
        ]),
    );
    assert_eq!(dataset.name, "SPY - 11/18/2025 04:14:50 PM");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    std::fs::write(&path, save_project(&[dataset.clone()]).unwrap()).unwrap();

    let loaded = load_project(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, vec![dataset.clone()]);

    let params = AnalysisParams::default();
    assert_eq!(
        analyze(&loaded[0].records, &params),
        analyze(&dataset.records, &params)
    );
}
