//! Where the encoders run.

use candle_core::Device;

/// Metal when the crate is built with `metal` and a GPU answers, else CPU.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            tracing::info!(device = device_label(&device), "encoder device selected");
            return device;
        }
        Err(e) => tracing::warn!(error = %e, "metal unavailable, falling back to cpu"),
    }
    tracing::info!(device = device_label(&Device::Cpu), "encoder device selected");
    Device::Cpu
}

pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "metal"))]
    #[test]
    fn default_build_runs_on_cpu() {
        let device = select_device();
        assert!(device.is_cpu());
        assert_eq!(device_label(&device), "cpu");
    }
}
