#![deny(clippy::all, clippy::pedantic)]

use crate::generate::Summary;

pub fn summary(summary: &Summary) {
    println!("Map saved to {}", summary.path.display());
    println!(
        "Resolution: {} at scale {} ({} effective)",
        summary.resolution, summary.scale_factor, summary.effective_resolution
    );
    println!("Style: {}", summary.style);
    println!("Size: {} KiB", summary.bytes.div_ceil(1024));
}
