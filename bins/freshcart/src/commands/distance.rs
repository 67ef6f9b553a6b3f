//! `freshcart distance`

use freshcart_cli::output::format_distance;
use freshcart_geo::{haversine_distance, Coordinate};

pub fn run(from: Coordinate, to: Coordinate, json: bool) -> anyhow::Result<()> {
    from.validate()?;
    to.validate()?;

    let km = haversine_distance(&from, &to);
    if json {
        println!(
            "{}",
            serde_json::json!({ "from": from, "to": to, "distance_km": km })
        );
    } else {
        println!("{}", format_distance(Some(km)));
    }

    Ok(())
}
