use std::path::PathBuf;

use deckscan_exp::{Campaign, GridParameter, GridSampler, RangeSpec};
use serde_json::json;

fn main() {
    let template = json!({
        "control": {"nx": 256, "t_end": 1.0e-12},
        "laser": {"lambda": 1.06e-6, "intensity_w_cm2": 1.0e18},
    });
    let grid = GridSampler::new(
        vec![
            GridParameter::range(
                "laser:intensity_w_cm2",
                RangeSpec::new(1.0e17, 1.0e20).with_log(true).with_n_samples(4),
            ),
            GridParameter::values("control:nx", vec![json!(256), json!(512)]),
        ],
        4,
    )
    .expect("grid");
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("target/grid_campaign");
    let mut campaign = Campaign::new(template, root);
    for sample in grid {
        let path = campaign.setup_case(&sample).expect("setup case");
        println!("{}", path.display());
    }
}
