/// The number of bits needed to store alpha values in `0..=denominator`.
///
/// This is the smallest `k` such that `1 << k > denominator`.
#[inline]
pub fn num_alpha_bits(denominator: u32) -> u32 {
    u32::BITS - denominator.leading_zeros()
}

/// The largest component id that fits next to `num_alpha_bits` alpha bits.
#[inline]
pub fn max_component_id(num_alpha_bits: u32) -> u32 {
    u32::MAX.checked_shr(num_alpha_bits).unwrap_or(0)
}

/// A single `(component id, alpha)` record of an [`Occmap`](super::Occmap) slot.
///
/// The record is packed as `(id << num_alpha_bits) | alpha` where `alpha` is
/// the covered fraction of the voxel, as a numerator over the denominator of
/// the map. The all-zero record means "empty slot". The packing width is not
/// stored in the record: it is a property of the whole map.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct Overlap(pub u32);

impl Overlap {
    /// The empty record.
    pub const EMPTY: Self = Self(0);

    /// Packs `id` and `alpha` with `num_alpha_bits` alpha bits.
    ///
    /// `alpha` must be smaller than `1 << num_alpha_bits` and `id` must not
    /// exceed [`max_component_id`]: excess bits are not masked.
    #[inline]
    pub fn new(id: u32, alpha: u32, num_alpha_bits: u32) -> Self {
        let mut result = Self::EMPTY;
        result.set(id, alpha, num_alpha_bits);
        result
    }

    /// Overwrites this record with a new `(id, alpha)` pair.
    #[inline]
    pub fn set(&mut self, id: u32, alpha: u32, num_alpha_bits: u32) {
        self.0 = id.checked_shl(num_alpha_bits).unwrap_or(0) | alpha;
    }

    /// The component id stored in this record.
    #[inline]
    pub fn id(self, num_alpha_bits: u32) -> u32 {
        self.0.checked_shr(num_alpha_bits).unwrap_or(0)
    }

    /// The alpha numerator stored in this record.
    #[inline]
    pub fn alpha(self, num_alpha_bits: u32) -> u32 {
        self.0 & !u32::MAX.checked_shl(num_alpha_bits).unwrap_or(0)
    }

    /// Is this the empty record?
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw packed word.
    #[inline]
    pub fn data(self) -> u32 {
        self.0
    }
}
