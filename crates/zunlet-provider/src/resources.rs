//! CPU and memory unit conversion between pods and capsules.
//!
//! Write path: CPU limits become fractional cores (`millis / 1000`), memory
//! limits become decimal gigabytes (`bytes / 1e9`). The template then
//! carries memory as `GB * 1024` megabytes.
//!
//! Read path: the engine reports memory in megabytes, which come back as
//! `Mi`, and CPU in cores, which come back as millicores. The two
//! directions do not invert each other: `256Mi` goes out as ~274.9 MB and
//! comes back as `275Mi`.
//!
//! The engine has no CPU or memory request. Requests are never written, and
//! on read they are reported equal to the limits.

use zunlet_core::{Quantity, RESOURCE_CPU, RESOURCE_MEMORY, ResourceList};

use crate::error::TranslateError;

const BYTES_PER_GB: f64 = 1e9;

/// CPU limit in cores, or `None` when the pod sets no CPU limit.
pub fn cpu_cores(container: &str, limits: &ResourceList) -> Result<Option<f64>, TranslateError> {
    limits
        .get(RESOURCE_CPU)
        .map(|q| {
            q.as_millis()
                .map(|millis| millis as f64 / 1000.0)
                .map_err(|source| TranslateError::Quantity {
                    container: container.to_string(),
                    resource: RESOURCE_CPU,
                    source,
                })
        })
        .transpose()
}

/// Memory limit in gigabytes, or `None` when the pod sets no memory limit.
pub fn memory_gb(container: &str, limits: &ResourceList) -> Result<Option<f64>, TranslateError> {
    limits
        .get(RESOURCE_MEMORY)
        .map(|q| {
            q.value()
                .map(|bytes| bytes / BYTES_PER_GB)
                .map_err(|source| TranslateError::Quantity {
                    container: container.to_string(),
                    resource: RESOURCE_MEMORY,
                    source,
                })
        })
        .transpose()
}

/// Reported cores as a CPU quantity.
pub fn cpu_quantity(cores: f64) -> Quantity {
    Quantity::from_millis((cores * 1000.0).round() as i64)
}

/// Reported memory (`"512"`, `"512M"`, `"512MB"`, `"1G"`, `"1GB"`) as a `Mi`
/// quantity. Gigabytes count as 1024 megabytes.
pub fn memory_quantity(container: &str, reported: &str) -> Result<Quantity, TranslateError> {
    let trimmed = reported.trim();
    let (digits, scale) = if let Some(gb) =
        trimmed.strip_suffix("GB").or_else(|| trimmed.strip_suffix('G'))
    {
        (gb, 1024.0)
    } else {
        let mb = trimmed
            .strip_suffix("MB")
            .or_else(|| trimmed.strip_suffix('M'))
            .unwrap_or(trimmed);
        (mb, 1.0)
    };

    match digits.trim().parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => {
            Ok(Quantity::from_mebibytes((n * scale).round() as u64))
        }
        _ => Err(TranslateError::InvalidMemory {
            container: container.to_string(),
            value: reported.to_string(),
        }),
    }
}

/// Limits for a capsule container as read back from the engine.
pub fn reported_limits(
    container: &str,
    cpu: Option<f64>,
    memory: Option<&str>,
) -> Result<ResourceList, TranslateError> {
    let mut limits = ResourceList::new();
    if let Some(cores) = cpu {
        limits.insert(RESOURCE_CPU.to_string(), cpu_quantity(cores));
    }
    if let Some(mb) = memory.filter(|m| !m.trim().is_empty()) {
        limits.insert(RESOURCE_MEMORY.to_string(), memory_quantity(container, mb)?);
    }
    Ok(limits)
}
