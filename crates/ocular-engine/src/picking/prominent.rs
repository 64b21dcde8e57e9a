/// Extra weight given to the run equal to the window's center value.
///
/// On an exact tie between the pixel under the cursor and another value, the
/// pixel under the cursor wins.
pub const CENTER_BONUS: usize = 1;

/// Most representative value of a sampled window.
///
/// `values` holds the window row-major and is sorted in place. `center` is the
/// value of the window's exact center cell. Runs equal to `sentinel` are never
/// elected; the run equal to `center` gets [`CENTER_BONUS`]; on equal scores
/// the run met first in ascending order wins. Returns `sentinel` when every
/// sample is the sentinel (or `values` is empty).
///
/// A single-sample window returns its only value unchanged.
pub fn most_prominent(values: &mut [u32], center: u32, sentinel: u32) -> u32 {
    if let [only] = values {
        return *only;
    }

    values.sort_unstable();

    let mut best = sentinel;
    let mut best_score = 0usize;

    for run in values.chunk_by(|a, b| a == b) {
        let value = run[0];
        if value == sentinel {
            continue;
        }

        let bonus = if value == center { CENTER_BONUS } else { 0 };
        let score = run.len() + bonus;
        if score > best_score {
            best = value;
            best_score = score;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: u32 = 0;
    const A: u32 = 0xFF00_0001;
    const B: u32 = 0xFF00_0002;

    fn run(mut window: Vec<u32>) -> u32 {
        let center = window[window.len() / 2];
        most_prominent(&mut window, center, N)
    }

    #[test]
    fn single_sample_is_returned_verbatim() {
        assert_eq!(most_prominent(&mut [A], A, N), A);
        assert_eq!(most_prominent(&mut [N], N, N), N);
    }

    #[test]
    fn all_sentinel_window_yields_sentinel() {
        assert_eq!(run(vec![N; 9]), N);
    }

    #[test]
    fn dominant_value_wins_regardless_of_position() {
        // A off-center, outnumbering the sentinel.
        let window = vec![
            A, A, A,
            A, N, N,
            A, N, N,
        ];
        assert_eq!(run(window), A);

        // A in the bottom-right corner only.
        let window = vec![
            N, N, N,
            N, N, A,
            N, A, A,
        ];
        assert_eq!(run(window), A);
    }

    #[test]
    fn center_wins_exact_ties() {
        // B at the center, four of each non-sentinel value.
        let window = vec![
            A, A, B,
            A, B, B,
            A, B, N,
        ];
        assert_eq!(run(window), B);
    }

    #[test]
    fn clear_majority_beats_center_bonus() {
        let window = vec![
            A, A, A,
            A, B, A,
            N, N, N,
        ];
        assert_eq!(run(window), A);
    }

    #[test]
    fn ties_without_center_resolve_to_lower_value() {
        // Center is the sentinel; A and B tie and A sorts first.
        let window = vec![
            B, B, N,
            N, N, N,
            A, A, N,
        ];
        assert_eq!(run(window), A);
    }

    #[test]
    fn tie_after_bonus_keeps_first_in_sorted_order() {
        // B (center) has 2 + 1, A has 3: equal score, A sorts first.
        let window = vec![
            A, N, N,
            A, B, B,
            A, N, N,
        ];
        assert_eq!(run(window), A);
    }

    #[test]
    fn sentinel_majority_never_wins() {
        let window = vec![
            N, N, N,
            N, N, N,
            N, N, A,
        ];
        assert_eq!(run(window), A);
    }
}
