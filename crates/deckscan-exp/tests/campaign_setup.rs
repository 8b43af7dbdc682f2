use std::fs;

use deckscan_exp::{
    deep_update, expand_flat_sample, Campaign, DeckFormat, GridParameter, GridSampler, RangeSpec,
    Sample,
};
use serde_json::json;

fn grid() -> GridSampler {
    GridSampler::new(
        vec![
            GridParameter::range(
                "block:var1",
                RangeSpec::new(1.0e1, 1.0e4).with_log(true).with_n_samples(2),
            ),
            GridParameter::range("block:var2", RangeSpec::new(2.0, 6.0).with_endpoint(false)),
            GridParameter::values("block:var3", vec![json!(-5), json!(15)]),
        ],
        4,
    )
    .expect("grid")
}

#[test]
fn campaign_writes_one_deck_per_grid_sample() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let template = json!({"block": {"var4": 1.23}, "other_block": {"var5": true}});
    let mut campaign = Campaign::new(template.clone(), temp.path());

    let paths: Vec<_> = grid()
        .map(|sample| campaign.setup_case(&sample).expect("setup case"))
        .collect();

    let base_path = temp.path().join("run_0_1000000/run_0_10000/run_0_100");
    let expected: Vec<_> = (0..16).map(|n| base_path.join(format!("run_{n}"))).collect();
    assert_eq!(paths, expected);
    assert!(paths.iter().all(|path| path.join("input.deck").is_file()));
    assert_eq!(campaign.counter(), 16);
    assert_eq!(campaign.template(), &template);

    let deck = DeckFormat::Deck
        .read_file(&base_path.join("run_4").join("input.deck"))
        .expect("read deck");
    assert_eq!(
        deck,
        json!({
            "block": {"var1": 1e1, "var2": 4.0, "var3": -5, "var4": 1.23},
            "other_block": {"var5": true},
        })
    );
}

#[test]
fn persisted_deck_matches_in_memory_merge() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let template = json!({
        "control": {"nx": 256, "t_end": 1.5e-12, "stdout_frequency": 10},
        "laser": {"lambda": 1.06e-6, "profile": "gaussian", "enabled": false},
    });
    let sample: Sample = [
        ("laser:lambda".to_string(), json!(8.0e-7)),
        ("laser:enabled".to_string(), json!(true)),
        ("control:nx".to_string(), json!(512)),
    ]
    .into_iter()
    .collect();
    let merged = deep_update(&template, &expand_flat_sample(&sample).expect("expand"));

    let mut campaign = Campaign::new(template, temp.path());
    let path = campaign.setup_case(&sample).expect("setup case");
    let text = fs::read_to_string(path.join("input.deck")).expect("read deck");
    assert!(text.contains("begin:laser\n"));
    assert_eq!(DeckFormat::Deck.from_bytes(text.as_bytes()).expect("parse"), merged);
    assert_eq!(merged["laser"]["profile"], json!("gaussian"));
    assert_eq!(merged["control"]["stdout_frequency"], json!(10));
}

#[test]
fn nested_templates_round_trip_through_yaml_and_json() {
    for format in [DeckFormat::Yaml, DeckFormat::Json] {
        let temp = tempfile::tempdir().expect("tmp dir");
        let template = json!({"species": {"electron": {"charge": -1.0, "mass": 1.0}}});
        let sample: Sample = [("species:electron:mass".to_string(), json!(1836.2))]
            .into_iter()
            .collect();
        let mut campaign = Campaign::with_format(template, temp.path(), format);
        let path = campaign.setup_case(&sample).expect("setup case");
        let mut file = fs::File::open(path.join(format.file_name())).expect("open config");
        let config = format.read(&mut file).expect("read config");
        assert_eq!(
            config,
            json!({"species": {"electron": {"charge": -1.0, "mass": 1836.2}}})
        );
    }
}

#[test]
fn repeated_species_blocks_survive_a_deck_campaign() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let template_path = temp.path().join("template.deck");
    fs::write(
        &template_path,
        "begin:species\n  name = electron\n  charge = -1.0\nend:species\n\n\
         begin:species\n  name = proton\n  mass = 1836.2\nend:species\n",
    )
    .expect("write template");
    let template = DeckFormat::Deck.read_file(&template_path).expect("parse template");
    assert_eq!(
        template,
        json!({"species": {"electron": {"charge": -1.0}, "proton": {"mass": 1836.2}}})
    );

    let sample: Sample = [("species:electron:charge".to_string(), json!(-2.0))]
        .into_iter()
        .collect();
    let mut campaign = Campaign::new(template, temp.path().join("runs"));
    let path = campaign.setup_case(&sample).expect("setup case");
    let text = fs::read_to_string(path.join("input.deck")).expect("read deck");
    assert_eq!(text.matches("begin:species\n").count(), 2);
    assert_eq!(
        DeckFormat::Deck.from_bytes(text.as_bytes()).expect("parse"),
        json!({"species": {"electron": {"charge": -2.0}, "proton": {"mass": 1836.2}}})
    );
}

#[test]
fn failed_case_does_not_consume_an_index() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let mut campaign = Campaign::new(json!({"block": {"a": 1, "b": 2}}), temp.path());
    let nested: Sample = [("block:a:deeper".to_string(), json!(2))].into_iter().collect();
    let err = campaign.setup_case(&nested).expect_err("deck cannot nest");
    assert_eq!(err.info().code, "deck-nested-value");
    assert_eq!(campaign.counter(), 0);

    let ok: Sample = [("block:a".to_string(), json!(2))].into_iter().collect();
    let path = campaign.setup_case(&ok).expect("setup case");
    assert!(path.ends_with("run_0"));
    assert_eq!(campaign.counter(), 1);
}

#[test]
fn blocked_root_surfaces_io_error() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, b"file").expect("write blocker");
    let mut campaign = Campaign::new(json!({"block": {"a": 1}}), &blocker);
    let err = campaign
        .setup_case(&Sample::new())
        .expect_err("root is a file");
    assert_eq!(err.info().code, "run-dir-create");
    assert_eq!(campaign.counter(), 0);
}
