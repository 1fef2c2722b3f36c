//! Smooth Unicode progress bar and the size/time labels shown next to it.

const MB: f64 = 1024.0 * 1024.0;

/// A bar `width` cells wide, `progress` in 0.0..=1.0, using eighth blocks.
pub fn bar(progress: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..full_blocks.min(width) {
        bar.push('█');
    }
    if full_blocks < width {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

/// `done/total` in whole megabytes.
pub fn fmt_done_total(done: u64, total: u64) -> String {
    format!("{}/{}", (done as f64 / MB) as u64, (total as f64 / MB) as u64)
}

/// Whole megabytes with a unit, e.g. `42mb`.
pub fn fmt_mb(bytes: u64) -> String {
    format!("{}mb", (bytes as f64 / MB) as u64)
}

pub fn fmt_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec <= 0.0 {
        return "-".to_string();
    }
    if bytes_per_sec >= MB {
        format!("{:.1} MB/s", bytes_per_sec / MB)
    } else {
        format!("{:.0} kB/s", bytes_per_sec / 1024.0)
    }
}

/// Video length as `mm:ss`; minutes are not wrapped into hours.
pub fn fmt_duration(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
