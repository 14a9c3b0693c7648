//! Pure calculation functions for variant dimensions.
//!
//! No I/O and no pixels — everything here is testable with plain numbers.

use super::backend::Dimensions;

/// One variant size to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSize {
    /// Breakpoint this variant serves (its filename width suffix).
    pub target: u32,
    /// Output width.
    pub width: u32,
    /// Output height.
    pub height: u32,
}

/// Which breakpoints apply to a source and at what output dimensions.
///
/// Breakpoints are measured against the longer edge; those exceeding it are
/// dropped — variants are never upscaled. If the source is smaller than
/// every breakpoint the result is a single variant at the source's own
/// longer edge (i.e. its native size).
pub fn variant_sizes(original: Dimensions, breakpoints: &[u32]) -> Vec<VariantSize> {
    let longer = original.longer_edge();

    let mut result: Vec<VariantSize> = breakpoints
        .iter()
        .filter(|&&bp| bp <= longer)
        .map(|&target| {
            let (width, height) = scale_to_longer_edge(original, target);
            VariantSize {
                target,
                width,
                height,
            }
        })
        .collect();

    if result.is_empty() {
        result.push(VariantSize {
            target: longer,
            width: original.width,
            height: original.height,
        });
    }

    result
}

/// Dimensions after scaling so the longer edge equals `target`,
/// aspect preserved.
fn scale_to_longer_edge(original: Dimensions, target: u32) -> (u32, u32) {
    if original.width >= original.height {
        let ratio = target as f64 / original.width as f64;
        (target, (original.height as f64 * ratio).round() as u32)
    } else {
        let ratio = target as f64 / original.height as f64;
        ((original.width as f64 * ratio).round() as u32, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    const BREAKPOINTS: &[u32] = &[320, 640, 960, 1280, 1920];

    #[test]
    fn breakpoints_above_source_are_dropped() {
        let sizes = variant_sizes(dims(1000, 750), BREAKPOINTS);
        let targets: Vec<u32> = sizes.iter().map(|s| s.target).collect();
        assert_eq!(targets, vec![320, 640, 960]);
    }

    #[test]
    fn landscape_scales_width_to_target() {
        let sizes = variant_sizes(dims(2000, 1500), &[1000]);
        assert_eq!(sizes.len(), 1);
        assert_eq!((sizes[0].width, sizes[0].height), (1000, 750));
    }

    #[test]
    fn portrait_scales_height_to_target() {
        let sizes = variant_sizes(dims(1500, 2000), &[1000]);
        assert_eq!(sizes.len(), 1);
        assert_eq!((sizes[0].width, sizes[0].height), (750, 1000));
    }

    #[test]
    fn tiny_source_falls_back_to_native_size() {
        let sizes = variant_sizes(dims(300, 200), BREAKPOINTS);
        assert_eq!(
            sizes,
            vec![VariantSize {
                target: 300,
                width: 300,
                height: 200,
            }]
        );
    }

    #[test]
    fn exact_breakpoint_match_is_included() {
        let sizes = variant_sizes(dims(640, 480), BREAKPOINTS);
        let targets: Vec<u32> = sizes.iter().map(|s| s.target).collect();
        assert_eq!(targets, vec![320, 640]);
    }

    #[test]
    fn breakpoints_apply_to_longer_edge_of_portrait() {
        // 500 wide but 2000 tall: 1920 applies (longer edge), output never
        // wider than the source.
        let sizes = variant_sizes(dims(500, 2000), &[1920]);
        assert_eq!(sizes[0].height, 1920);
        assert_eq!(sizes[0].width, 480);
    }

    #[test]
    fn order_follows_breakpoint_list() {
        let sizes = variant_sizes(dims(3000, 2000), BREAKPOINTS);
        let targets: Vec<u32> = sizes.iter().map(|s| s.target).collect();
        assert_eq!(targets, vec![320, 640, 960, 1280, 1920]);
    }
}
