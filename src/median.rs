//! Fixed-size median selection networks.
//!
//! Each function runs a fixed, input-independent sequence of
//! compare-and-swap operations, so the cost of a median extraction is
//! determined entirely by the window size — no data-dependent branching,
//! no allocation. The sequences come from N. Devillard's 1998 collection
//! of optimised median search networks (med3/5/7 from
//! sci.image.processing, med9 from XILINX XCELL vol. 23, med25 from
//! Graphics Gems) and the even-length network of Havlicek, Sakady and
//! Katz for med6. The operation ORDER is load-bearing; do not reorder or
//! "simplify" these into a sort.
//!
//! ## Side effect
//!
//! The input array is permuted in place: after the call the median
//! occupies its defined slot, but the remaining elements are only
//! partially ordered. Callers must not assume a sorted array afterward.

/// Compare-and-swap: leaves the smaller value at index `a`.
#[inline]
fn sort_pair(p: &mut [i32], a: usize, b: usize) {
    if p[a] > p[b] {
        p.swap(a, b);
    }
}

/// Median of 3. Leaves the median in slot 1.
pub fn median3(p: &mut [i32; 3]) -> i32 {
    sort_pair(p, 0, 1);
    sort_pair(p, 1, 2);
    sort_pair(p, 0, 1);
    p[1]
}

/// Median of 5. Leaves the median in slot 2.
pub fn median5(p: &mut [i32; 5]) -> i32 {
    sort_pair(p, 0, 1);
    sort_pair(p, 3, 4);
    sort_pair(p, 0, 3);
    sort_pair(p, 1, 4);
    sort_pair(p, 1, 2);
    sort_pair(p, 2, 3);
    sort_pair(p, 1, 2);
    p[2]
}

/// Median of 6: the arithmetic mean of the two central order statistics
/// (lower median lands in slot 2, upper in slot 3).
pub fn median6(p: &mut [i32; 6]) -> f32 {
    sort_pair(p, 1, 2);
    sort_pair(p, 3, 4);
    sort_pair(p, 0, 1);
    sort_pair(p, 2, 3);
    sort_pair(p, 4, 5);
    sort_pair(p, 1, 2);
    sort_pair(p, 3, 4);
    sort_pair(p, 0, 1);
    sort_pair(p, 2, 3);
    sort_pair(p, 4, 5);
    sort_pair(p, 1, 2);
    sort_pair(p, 3, 4);
    (p[2] + p[3]) as f32 * 0.5
}

/// Median of 7. Leaves the median in slot 3.
pub fn median7(p: &mut [i32; 7]) -> i32 {
    sort_pair(p, 0, 5);
    sort_pair(p, 0, 3);
    sort_pair(p, 1, 6);
    sort_pair(p, 2, 4);
    sort_pair(p, 0, 1);
    sort_pair(p, 3, 5);
    sort_pair(p, 2, 6);
    sort_pair(p, 2, 3);
    sort_pair(p, 3, 6);
    sort_pair(p, 4, 5);
    sort_pair(p, 1, 4);
    sort_pair(p, 1, 3);
    sort_pair(p, 3, 4);
    p[3]
}

/// Median of 9. Leaves the median in slot 4.
///
/// The last three exchanges run "backwards" (higher index first); that
/// is part of the published network, not a typo.
pub fn median9(p: &mut [i32; 9]) -> i32 {
    sort_pair(p, 1, 2);
    sort_pair(p, 4, 5);
    sort_pair(p, 7, 8);
    sort_pair(p, 0, 1);
    sort_pair(p, 3, 4);
    sort_pair(p, 6, 7);
    sort_pair(p, 1, 2);
    sort_pair(p, 4, 5);
    sort_pair(p, 7, 8);
    sort_pair(p, 0, 3);
    sort_pair(p, 5, 8);
    sort_pair(p, 4, 7);
    sort_pair(p, 3, 6);
    sort_pair(p, 1, 4);
    sort_pair(p, 2, 5);
    sort_pair(p, 4, 7);
    sort_pair(p, 4, 2);
    sort_pair(p, 6, 4);
    sort_pair(p, 4, 2);
    p[4]
}

/// Median of 25. Leaves the median in slot 12.
pub fn median25(p: &mut [i32; 25]) -> i32 {
    sort_pair(p, 0, 1);
    sort_pair(p, 3, 4);
    sort_pair(p, 2, 4);
    sort_pair(p, 2, 3);
    sort_pair(p, 6, 7);
    sort_pair(p, 5, 7);
    sort_pair(p, 5, 6);
    sort_pair(p, 9, 10);
    sort_pair(p, 8, 10);
    sort_pair(p, 8, 9);
    sort_pair(p, 12, 13);
    sort_pair(p, 11, 13);
    sort_pair(p, 11, 12);
    sort_pair(p, 15, 16);
    sort_pair(p, 14, 16);
    sort_pair(p, 14, 15);
    sort_pair(p, 18, 19);
    sort_pair(p, 17, 19);
    sort_pair(p, 17, 18);
    sort_pair(p, 21, 22);
    sort_pair(p, 20, 22);
    sort_pair(p, 20, 21);
    sort_pair(p, 23, 24);
    sort_pair(p, 2, 5);
    sort_pair(p, 3, 6);
    sort_pair(p, 0, 6);
    sort_pair(p, 0, 3);
    sort_pair(p, 4, 7);
    sort_pair(p, 1, 7);
    sort_pair(p, 1, 4);
    sort_pair(p, 11, 14);
    sort_pair(p, 8, 14);
    sort_pair(p, 8, 11);
    sort_pair(p, 12, 15);
    sort_pair(p, 9, 15);
    sort_pair(p, 9, 12);
    sort_pair(p, 13, 16);
    sort_pair(p, 10, 16);
    sort_pair(p, 10, 13);
    sort_pair(p, 20, 23);
    sort_pair(p, 17, 23);
    sort_pair(p, 17, 20);
    sort_pair(p, 21, 24);
    sort_pair(p, 18, 24);
    sort_pair(p, 18, 21);
    sort_pair(p, 19, 22);
    sort_pair(p, 8, 17);
    sort_pair(p, 9, 18);
    sort_pair(p, 0, 18);
    sort_pair(p, 0, 9);
    sort_pair(p, 10, 19);
    sort_pair(p, 1, 19);
    sort_pair(p, 1, 10);
    sort_pair(p, 11, 20);
    sort_pair(p, 2, 20);
    sort_pair(p, 2, 11);
    sort_pair(p, 12, 21);
    sort_pair(p, 3, 21);
    sort_pair(p, 3, 12);
    sort_pair(p, 13, 22);
    sort_pair(p, 4, 22);
    sort_pair(p, 4, 13);
    sort_pair(p, 14, 23);
    sort_pair(p, 5, 23);
    sort_pair(p, 5, 14);
    sort_pair(p, 15, 24);
    sort_pair(p, 6, 24);
    sort_pair(p, 6, 15);
    sort_pair(p, 7, 16);
    sort_pair(p, 7, 19);
    sort_pair(p, 13, 21);
    sort_pair(p, 15, 23);
    sort_pair(p, 7, 13);
    sort_pair(p, 7, 15);
    sort_pair(p, 1, 9);
    sort_pair(p, 3, 11);
    sort_pair(p, 5, 17);
    sort_pair(p, 11, 17);
    sort_pair(p, 9, 17);
    sort_pair(p, 4, 10);
    sort_pair(p, 6, 12);
    sort_pair(p, 7, 14);
    sort_pair(p, 4, 6);
    sort_pair(p, 4, 7);
    sort_pair(p, 12, 14);
    sort_pair(p, 10, 14);
    sort_pair(p, 6, 7);
    sort_pair(p, 10, 12);
    sort_pair(p, 6, 10);
    sort_pair(p, 6, 17);
    sort_pair(p, 12, 17);
    sort_pair(p, 7, 17);
    sort_pair(p, 7, 10);
    sort_pair(p, 12, 18);
    sort_pair(p, 7, 12);
    sort_pair(p, 10, 18);
    sort_pair(p, 12, 20);
    sort_pair(p, 10, 20);
    sort_pair(p, 10, 12);
    p[12]
}
