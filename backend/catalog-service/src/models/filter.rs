use super::memory::MemoryExt;
use crate::proto::catalog::v1::{Device, Filter};

/// All four predicates must hold: price, core count, base clock and RAM
///
/// A device with no CPU or RAM section counts as zero cores, 0 GHz and zero
/// bits.
pub fn matches_filter(filter: &Filter, device: &Device) -> bool {
    if device.price_usd > filter.max_price_usd {
        return false;
    }

    let (cores, min_ghz) = device
        .cpu
        .as_ref()
        .map(|cpu| (cpu.number_cores, cpu.min_ghz))
        .unwrap_or_default();
    if cores < filter.min_cpu_cores {
        return false;
    }
    if min_ghz < filter.min_cpu_ghz {
        return false;
    }

    let ram_bits = device.ram.as_ref().map(MemoryExt::to_bits).unwrap_or(0);
    let min_ram_bits = filter.min_ram.as_ref().map(MemoryExt::to_bits).unwrap_or(0);
    ram_bits >= min_ram_bits
}
