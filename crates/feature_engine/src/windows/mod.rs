// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers related to generating the windows of a sequence

use feature_types::{ValidatedWindow, WindowPosition, WindowType};

/// The windows of one directional scan over a sequence, in ascending start
/// order.
///
/// A from-start scan begins at `start_index` and advances by the step. A
/// from-end scan is anchored so that its last window ends at the effective
/// end, walking back by the step; with a `num_windows` cap it keeps the
/// windows closest to the end. The two scans align differently whenever the
/// scanned range is not a whole number of steps longer than the window.
///
/// Every window is exactly `window_size` long: a region shorter than the
/// window yields nothing.
#[derive(Clone, Debug)]
pub struct ScanWindows {
    next_start: usize,
    window_size: usize,
    step: usize,
    remaining: usize,
    window_type: WindowType,
}

impl ScanWindows {
    pub fn new(scan: &ValidatedWindow, sequence_len: usize) -> Self {
        let window_size = scan.window_size.get();
        let step = scan.step.get();
        let effective_end = scan.effective_end(sequence_len);

        let available = match effective_end.checked_sub(scan.start_index + window_size) {
            Some(slack) => slack / step + 1,
            None => 0,
        };
        let count = scan.num_windows.map_or(available, |cap| cap.min(available));

        let first_start = match scan.direction {
            WindowType::Start => scan.start_index,
            // count > 0 implies effective_end - window_size >= start_index
            // and that the earliest kept window lies at or after it
            WindowType::End if count > 0 => effective_end - window_size - (count - 1) * step,
            WindowType::End => 0,
        };

        Self {
            next_start: first_start,
            window_size,
            step,
            remaining: count,
            window_type: scan.direction,
        }
    }
}

impl Iterator for ScanWindows {
    type Item = WindowPosition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let start = self.next_start;
        self.next_start += self.step;
        Some(WindowPosition {
            start,
            end: start + self.window_size,
            window_type: self.window_type,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ScanWindows {}

/// All windows of every enabled scan, merged into ascending start order.
/// At equal starts, from-start windows come before from-end ones.
pub fn enumerate_windows(scans: &[ValidatedWindow], sequence_len: usize) -> Vec<WindowPosition> {
    let mut windows: Vec<WindowPosition> = scans
        .iter()
        .flat_map(|scan| ScanWindows::new(scan, sequence_len))
        .collect();
    windows.sort_by_key(|w| (w.start, w.window_type));
    windows
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use feature_types::SingleWindowConfig;
    use quickcheck::{quickcheck, Arbitrary, Gen};

    use super::*;

    fn scan(direction: WindowType, config: SingleWindowConfig) -> ValidatedWindow {
        config.validate(direction).unwrap().unwrap()
    }

    fn starts(scan: &ValidatedWindow, len: usize) -> Vec<usize> {
        ScanWindows::new(scan, len).map(|w| w.start).collect()
    }

    #[test]
    fn non_overlapping_from_start() {
        let s = scan(
            WindowType::Start,
            SingleWindowConfig::new(3, 3).with_start_index(0),
        );
        let windows: Vec<_> = ScanWindows::new(&s, 12).collect();
        assert_eq!(windows.iter().map(|w| w.start).collect::<Vec<_>>(), [0, 3, 6, 9]);
        assert!(windows.iter().all(|w| w.len() == 3));
    }

    #[test]
    fn window_barely_fits() {
        let s = scan(WindowType::Start, SingleWindowConfig::new(5, 2));
        assert_eq!(starts(&s, 6), [0]);
        let s = scan(WindowType::End, SingleWindowConfig::new(5, 2));
        assert_eq!(starts(&s, 6), [1]);
    }

    #[test]
    fn short_sequences_yield_nothing() {
        for direction in [WindowType::Start, WindowType::End] {
            let s = scan(direction, SingleWindowConfig::new(10, 1));
            assert!(starts(&s, 9).is_empty());
            assert!(starts(&s, 0).is_empty());
        }
    }

    #[test]
    fn directions_align_differently() {
        let start = scan(WindowType::Start, SingleWindowConfig::new(4, 3));
        let end = scan(WindowType::End, SingleWindowConfig::new(4, 3));
        assert_eq!(starts(&start, 11), [0, 3, 6]);
        assert_eq!(starts(&end, 11), [1, 4, 7]);
    }

    #[test]
    fn caps_keep_the_anchored_end() {
        let start = scan(
            WindowType::Start,
            SingleWindowConfig::new(2, 1).with_num_windows(2),
        );
        let end = scan(
            WindowType::End,
            SingleWindowConfig::new(2, 1).with_num_windows(2),
        );
        assert_eq!(starts(&start, 10), [0, 1]);
        assert_eq!(starts(&end, 10), [7, 8]);

        let none = scan(
            WindowType::Start,
            SingleWindowConfig::new(2, 1).with_num_windows(0),
        );
        assert!(starts(&none, 10).is_empty());
    }

    #[test]
    fn bounds_restrict_the_scan() {
        let s = scan(
            WindowType::End,
            SingleWindowConfig::new(3, 2)
                .with_start_index(2)
                .with_end_index(9),
        );
        assert_eq!(starts(&s, 100), [2, 4, 6]);

        let past_end = scan(
            WindowType::Start,
            SingleWindowConfig::new(1, 1).with_start_index(20),
        );
        assert!(starts(&past_end, 10).is_empty());
    }

    #[test]
    fn merged_families_are_ordered_with_start_first() {
        let scans = [
            scan(WindowType::Start, SingleWindowConfig::new(4, 4)),
            scan(WindowType::End, SingleWindowConfig::new(4, 4)),
        ];
        let merged: Vec<_> = enumerate_windows(&scans, 8)
            .into_iter()
            .map(|w| (w.start, w.window_type))
            .collect();
        assert_eq!(
            merged,
            [
                (0, WindowType::Start),
                (0, WindowType::End),
                (4, WindowType::Start),
                (4, WindowType::End),
            ]
        );
    }

    #[derive(Clone, Debug)]
    struct ArbitraryScan(ValidatedWindow);

    impl Arbitrary for ArbitraryScan {
        fn arbitrary(g: &mut Gen) -> Self {
            let small = |g: &mut Gen| usize::arbitrary(g) % 40;
            let direction = *g.choose(&[WindowType::Start, WindowType::End]).unwrap();
            let start_index = small(g);
            let end_index = Option::<()>::arbitrary(g).map(|_| start_index + small(g));
            Self(ValidatedWindow {
                direction,
                window_size: NonZeroUsize::new(1 + small(g)).unwrap(),
                step: NonZeroUsize::new(1 + small(g) % 10).unwrap(),
                start_index,
                end_index,
                num_windows: Option::<()>::arbitrary(g).map(|_| small(g)),
            })
        }
    }

    // The scans as literal loops, for comparison.
    fn reference_starts(scan: &ValidatedWindow, len: usize) -> Vec<usize> {
        let ws = scan.window_size.get();
        let step = scan.step.get();
        let end = scan.effective_end(len);
        let cap = scan.num_windows.unwrap_or(usize::MAX);
        let mut starts = vec![];
        match scan.direction {
            WindowType::Start => {
                let mut start = scan.start_index;
                while start + ws <= end && starts.len() < cap {
                    starts.push(start);
                    start += step;
                }
            }
            WindowType::End => {
                let mut current_end = end;
                while let Some(start) = current_end.checked_sub(ws) {
                    if start < scan.start_index || starts.len() >= cap {
                        break;
                    }
                    starts.push(start);
                    match current_end.checked_sub(step) {
                        Some(next) => current_end = next,
                        None => break,
                    }
                }
                starts.reverse();
            }
        }
        starts
    }

    quickcheck! {
        fn scans_match_reference(scan: ArbitraryScan, len: u8) -> bool {
            starts(&scan.0, len as usize) == reference_starts(&scan.0, len as usize)
        }

        fn windows_are_full_length_and_in_bounds(scan: ArbitraryScan, len: u8) -> bool {
            let len = len as usize;
            let end = scan.0.effective_end(len);
            ScanWindows::new(&scan.0, len).all(|w| {
                w.start >= scan.0.start_index
                    && w.start < w.end
                    && w.end <= end
                    && w.len() == scan.0.window_size.get()
            })
        }

        fn merged_windows_ascend(a: ArbitraryScan, b: ArbitraryScan, len: u8) -> bool {
            let windows = enumerate_windows(&[a.0, b.0], len as usize);
            windows.windows(2).all(|pair| pair[0].start <= pair[1].start)
        }
    }
}
