pub mod consensus {
    //!
    //! A module for constants which directly impact consensus.
    //!

    use crate::KType;

    /// Default cluster bound, matching a 1 block-per-second network with a 5 second delay bound
    pub const DEFAULT_GHOSTDAG_K: KType = 18;

    /// Estimated upper bound on network delay in seconds
    pub const NETWORK_DELAY_BOUND: f64 = 5.0;

    /// **Desired** upper bound on the probability of anticones larger than k
    pub const GHOSTDAG_TAIL_DELTA: f64 = 0.01;

    /// Number of seconds-per-block rates scanned when mapping k values back to block rates
    pub const MAX_SECONDS_PER_BLOCK: u64 = 100;
}
