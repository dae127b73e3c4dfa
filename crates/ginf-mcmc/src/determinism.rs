use ginf_core::derive_substream_seed;

/// Seed of one temperature segment of an annealing schedule.
pub fn segment_seed(master_seed: u64, segment: usize) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, segment as u64)
}
