/// Frame rate of the video standard with `scanning` lines, as a fraction.
pub fn frame_rate(scanning: u32) -> (u64, u64) {
    if scanning == 525 { (30000, 1001) } else { (25, 1) }
}

/// Time of field pair `frame` as `HH:MM:SS.mmm`.
pub fn frame_time(frame: u64, scanning: u32) -> String {
    let (num, den) = frame_rate(scanning);
    let ms = frame * den * 1000 / num;

    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let milliseconds = ms % 1000;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}

#[test]
fn frame_times() {
    assert_eq!(frame_time(0, 625), "00:00:00.000");
    assert_eq!(frame_time(26, 625), "00:00:01.040");
    assert_eq!(frame_time(25 * 3661, 625), "01:01:01.000");
    assert_eq!(frame_time(30, 525), "00:00:01.001");
}
