use std::f64::consts::PI;

pub fn simulated_temperature(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    // Coolest just before dawn, warmest mid afternoon
    let curve = (radians - PI * 0.75).sin();
    18.0 + curve * 6.0
}

pub fn simulated_humidity(day_fraction: f64) -> f64 {
    let radians = day_fraction * 2.0 * PI;

    if (0.3..=0.7).contains(&day_fraction) {
        (radians.sin().max(0.0) * -15.0) + 55.0
    } else {
        (radians.cos().max(0.0) * 20.0) + 60.0
    }
}
