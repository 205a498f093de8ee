//! Random device records and scores for tests and demo clients

use crate::proto::catalog::v1::{memory::Unit, storage::Driver, Cpu, Device, Gpu, Memory, Storage};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

const CPU_BRANDS: &[&str] = &["Intel", "AMD"];
const GPU_BRANDS: &[&str] = &["NVIDIA", "AMD"];
const DEVICE_BRANDS: &[&str] = &["Apple", "Dell", "Lenovo"];

fn pick(options: &[&'static str]) -> String {
    options
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

fn gigabytes(value: u64) -> Memory {
    Memory {
        value,
        unit: Unit::Gigabyte as i32,
    }
}

pub fn new_cpu() -> Cpu {
    let mut rng = rand::thread_rng();
    let brand = pick(CPU_BRANDS);
    let name = match brand.as_str() {
        "Intel" => pick(&["Xeon E-2286M", "Core i9-9980HK", "Core i7-9750H", "Core i5-9400F"]),
        _ => pick(&["Ryzen 7 PRO 2700U", "Ryzen 5 PRO 3500U", "Ryzen 3 PRO 3200GE"]),
    };

    let number_cores = rng.gen_range(4..=8);
    let number_threads = rng.gen_range(number_cores..=16);
    let min_ghz = rng.gen_range(2.0..3.5);
    let max_ghz = rng.gen_range(min_ghz..5.0);

    Cpu {
        brand,
        name,
        number_cores,
        number_threads,
        min_ghz,
        max_ghz,
    }
}

pub fn new_gpu() -> Gpu {
    let mut rng = rand::thread_rng();
    let brand = pick(GPU_BRANDS);
    let name = match brand.as_str() {
        "NVIDIA" => pick(&["RTX 2060", "RTX 2070", "GTX 1660-Ti"]),
        _ => pick(&["RX 590", "RX 580", "RX Vega-56"]),
    };
    let min_ghz = rng.gen_range(1.0..1.5);
    let max_ghz = rng.gen_range(min_ghz..2.0);

    Gpu {
        brand,
        name,
        min_ghz,
        max_ghz,
        memory: Some(gigabytes(rng.gen_range(2..=6))),
    }
}

pub fn new_ram() -> Memory {
    gigabytes(rand::thread_rng().gen_range(8..=32))
}

pub fn new_ssd() -> Storage {
    Storage {
        driver: Driver::Ssd as i32,
        memory: Some(gigabytes(rand::thread_rng().gen_range(128..=1024))),
    }
}

pub fn new_hdd() -> Storage {
    Storage {
        driver: Driver::Hdd as i32,
        memory: Some(Memory {
            value: rand::thread_rng().gen_range(1..=4),
            unit: Unit::Terabyte as i32,
        }),
    }
}

/// A complete device with a fresh UUID
pub fn new_device() -> Device {
    let mut rng = rand::thread_rng();
    let brand = pick(DEVICE_BRANDS);
    let name = match brand.as_str() {
        "Apple" => pick(&["Macbook Air", "Macbook Pro"]),
        "Dell" => pick(&["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => pick(&["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    };

    Device {
        id: Uuid::new_v4().to_string(),
        brand,
        name,
        cpu: Some(new_cpu()),
        ram: Some(new_ram()),
        gpus: vec![new_gpu()],
        storages: vec![new_ssd(), new_hdd()],
        price_usd: rng.gen_range(1500.0..3500.0),
        release_year: rng.gen_range(2015..=2024),
    }
}

/// Whole-number score in 1..=10
pub fn random_score() -> f64 {
    f64::from(rand::thread_rng().gen_range(1u32..=10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_is_complete() {
        let device = new_device();
        assert!(Uuid::parse_str(&device.id).is_ok());

        let cpu = device.cpu.unwrap();
        assert!((4..=8).contains(&cpu.number_cores));
        assert!(cpu.number_threads >= cpu.number_cores);
        assert!(cpu.max_ghz >= cpu.min_ghz);
        assert_eq!(device.storages.len(), 2);
    }

    #[test]
    fn test_random_score_range() {
        for _ in 0..100 {
            let score = random_score();
            assert!((1.0..=10.0).contains(&score));
            assert_eq!(score.fract(), 0.0);
        }
    }
}
