/// 將影片長度均分為 `count + 1` 段，取每個分界點作為截圖時間
///
/// 結果嚴格遞增且落在 `(0, duration)` 開區間內，避開片頭與片尾的黑畫面。
#[must_use]
pub fn select_timestamps(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 || !(duration.is_finite() && duration > 0.0) {
        return Vec::new();
    }

    let step = duration / (count + 1) as f64;
    (1..=count).map(|i| step * i as f64).collect()
}
