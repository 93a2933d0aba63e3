//! Memory statistics from native OS interfaces (non-Linux).
//!
//! The queries themselves live behind [`NativeMemoryQuery`] so that the key
//! layout produced by [`aggregate`] is the same on every host and can be
//! tested without a Mach kernel.

use std::collections::HashMap;

use super::error::Result;

/// Page counters reported by the virtual-memory subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmStatistics {
    pub active_count: u64,
    pub inactive_count: u64,
    pub wire_count: u64,
    pub free_count: u64,
    pub compressor_page_count: u64,
    pub internal_page_count: u64,
    pub purgeable_count: u64,
    /// Cumulative page-ins.
    pub pageins: u64,
    /// Cumulative page-outs.
    pub pageouts: u64,
}

/// Swap usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapUsage {
    pub total: u64,
    pub used: u64,
}

/// Native queries needed to build the memory record set.
pub trait NativeMemoryQuery {
    fn vm_statistics(&self) -> Result<VmStatistics>;

    /// Physical memory in bytes.
    fn total_memory(&self) -> Result<u64>;

    fn swap_usage(&self) -> Result<SwapUsage>;

    /// Size in bytes of the pages counted by [`VmStatistics`].
    fn page_size(&self) -> Result<u64>;
}

/// Builds the canonical key -> bytes map. Page counts are scaled by the page
/// size; page-in/page-out are exposed as `_total` counters.
pub fn aggregate<Q: NativeMemoryQuery + ?Sized>(query: &Q) -> Result<HashMap<String, f64>> {
    let vmstat = query.vm_statistics()?;
    let total = query.total_memory()?;
    let swap = query.swap_usage()?;
    let ps = query.page_size()? as f64;

    let pages = |count: u64| ps * count as f64;

    Ok(HashMap::from([
        ("active_bytes".to_string(), pages(vmstat.active_count)),
        ("compressed_bytes".to_string(), pages(vmstat.compressor_page_count)),
        ("inactive_bytes".to_string(), pages(vmstat.inactive_count)),
        ("wired_bytes".to_string(), pages(vmstat.wire_count)),
        ("free_bytes".to_string(), pages(vmstat.free_count)),
        ("swapped_in_bytes_total".to_string(), pages(vmstat.pageins)),
        ("swapped_out_bytes_total".to_string(), pages(vmstat.pageouts)),
        ("internal_bytes".to_string(), pages(vmstat.internal_page_count)),
        ("purgeable_bytes".to_string(), pages(vmstat.purgeable_count)),
        ("total_bytes".to_string(), total as f64),
        ("swap_used_bytes".to_string(), swap.used as f64),
        ("swap_total_bytes".to_string(), swap.total as f64),
    ]))
}

#[cfg(target_os = "macos")]
pub use darwin::MachMemoryQuery;

#[cfg(target_os = "macos")]
mod darwin {
    use std::ffi::CStr;
    use std::mem::{self, MaybeUninit};
    use std::ptr;

    use super::{NativeMemoryQuery, SwapUsage, VmStatistics};
    use crate::meminfo::error::{MeminfoError, Result};

    /// Mach `host_statistics64` plus `sysctl` backed queries.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct MachMemoryQuery;

    fn last_os_error_code() -> i64 {
        std::io::Error::last_os_error()
            .raw_os_error()
            .map(i64::from)
            .unwrap_or(-1)
    }

    /// Reads a fixed-size sysctl value by name.
    fn sysctl_value<T: Copy>(name: &CStr, query: &'static str) -> Result<T> {
        let mut value = MaybeUninit::<T>::zeroed();
        let mut len = mem::size_of::<T>();
        // SAFETY: `value` is a writable buffer of exactly `len` bytes and
        // `name` is NUL terminated.
        let ret = unsafe {
            libc::sysctlbyname(
                name.as_ptr(),
                value.as_mut_ptr().cast(),
                &mut len,
                ptr::null_mut(),
                0,
            )
        };
        if ret != 0 {
            return Err(MeminfoError::NativeQuery {
                query,
                code: last_os_error_code(),
            });
        }
        if len != mem::size_of::<T>() {
            return Err(MeminfoError::NativeQuery {
                query,
                code: len as i64,
            });
        }
        // SAFETY: the kernel filled all `size_of::<T>()` bytes and T is POD.
        Ok(unsafe { value.assume_init() })
    }

    impl NativeMemoryQuery for MachMemoryQuery {
        fn vm_statistics(&self) -> Result<VmStatistics> {
            // SAFETY: zeroed is a valid vm_statistics64 (plain integers).
            let mut vmstat: libc::vm_statistics64 = unsafe { mem::zeroed() };
            let mut count = libc::HOST_VM_INFO64_COUNT;

            #[allow(deprecated)]
            // SAFETY: `vmstat` has room for HOST_VM_INFO64_COUNT integers.
            let ret = unsafe {
                libc::host_statistics64(
                    libc::mach_host_self(),
                    libc::HOST_VM_INFO64,
                    &mut vmstat as *mut libc::vm_statistics64 as libc::host_info64_t,
                    &mut count,
                )
            };
            if ret != libc::KERN_SUCCESS {
                return Err(MeminfoError::NativeQuery {
                    query: "memory statistics (host_statistics64)",
                    code: i64::from(ret),
                });
            }

            Ok(VmStatistics {
                active_count: vmstat.active_count as u64,
                inactive_count: vmstat.inactive_count as u64,
                wire_count: vmstat.wire_count as u64,
                free_count: vmstat.free_count as u64,
                compressor_page_count: vmstat.compressor_page_count as u64,
                internal_page_count: vmstat.internal_page_count as u64,
                purgeable_count: vmstat.purgeable_count as u64,
                pageins: vmstat.pageins as u64,
                pageouts: vmstat.pageouts as u64,
            })
        }

        fn total_memory(&self) -> Result<u64> {
            sysctl_value::<u64>(c"hw.memsize", "total memory (hw.memsize)")
        }

        fn swap_usage(&self) -> Result<SwapUsage> {
            let swap = sysctl_value::<libc::xsw_usage>(c"vm.swapusage", "swap usage (vm.swapusage)")?;
            Ok(SwapUsage {
                total: swap.xsu_total,
                used: swap.xsu_used,
            })
        }

        fn page_size(&self) -> Result<u64> {
            // SAFETY: sysconf has no memory-safety preconditions.
            let ps = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            if ps <= 0 {
                return Err(MeminfoError::NativeQuery {
                    query: "page size (_SC_PAGESIZE)",
                    code: last_os_error_code(),
                });
            }
            Ok(ps as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meminfo::error::MeminfoError;
    use crate::meminfo::MetricKind;

    struct FakeQuery {
        fail: Option<&'static str>,
    }

    impl FakeQuery {
        fn check(&self, query: &'static str) -> Result<()> {
            if self.fail == Some(query) {
                return Err(MeminfoError::NativeQuery { query, code: 5 });
            }
            Ok(())
        }
    }

    impl NativeMemoryQuery for FakeQuery {
        fn vm_statistics(&self) -> Result<VmStatistics> {
            self.check("vm")?;
            Ok(VmStatistics {
                active_count: 1,
                inactive_count: 2,
                wire_count: 3,
                free_count: 4,
                compressor_page_count: 5,
                internal_page_count: 6,
                purgeable_count: 7,
                pageins: 8,
                pageouts: 9,
            })
        }

        fn total_memory(&self) -> Result<u64> {
            self.check("total")?;
            Ok(17_179_869_184)
        }

        fn swap_usage(&self) -> Result<SwapUsage> {
            self.check("swap")?;
            Ok(SwapUsage {
                total: 2048,
                used: 1024,
            })
        }

        fn page_size(&self) -> Result<u64> {
            Ok(16384)
        }
    }

    #[test]
    fn test_page_counts_scaled_by_page_size() {
        let info = aggregate(&FakeQuery { fail: None }).unwrap();
        assert_eq!(info.len(), 12);
        assert_eq!(info["active_bytes"], 16384.0);
        assert_eq!(info["inactive_bytes"], 2.0 * 16384.0);
        assert_eq!(info["wired_bytes"], 3.0 * 16384.0);
        assert_eq!(info["free_bytes"], 4.0 * 16384.0);
        assert_eq!(info["compressed_bytes"], 5.0 * 16384.0);
        assert_eq!(info["internal_bytes"], 6.0 * 16384.0);
        assert_eq!(info["purgeable_bytes"], 7.0 * 16384.0);
        assert_eq!(info["swapped_in_bytes_total"], 8.0 * 16384.0);
        assert_eq!(info["swapped_out_bytes_total"], 9.0 * 16384.0);
    }

    #[test]
    fn test_byte_quantities_not_scaled() {
        let info = aggregate(&FakeQuery { fail: None }).unwrap();
        assert_eq!(info["total_bytes"], 17_179_869_184.0);
        assert_eq!(info["swap_total_bytes"], 2048.0);
        assert_eq!(info["swap_used_bytes"], 1024.0);
    }

    #[test]
    fn test_only_paging_counters_are_counters() {
        let info = aggregate(&FakeQuery { fail: None }).unwrap();
        let counters: Vec<&str> = info
            .keys()
            .filter(|k| MetricKind::from_name(k) == MetricKind::Counter)
            .map(String::as_str)
            .collect();
        assert_eq!(counters.len(), 2);
        assert!(counters.contains(&"swapped_in_bytes_total"));
        assert!(counters.contains(&"swapped_out_bytes_total"));
    }

    #[test]
    fn test_any_query_failure_is_fatal() {
        for failing in ["vm", "total", "swap"] {
            match aggregate(&FakeQuery { fail: Some(failing) }) {
                Err(MeminfoError::NativeQuery { query, code }) => {
                    assert_eq!(query, failing);
                    assert_eq!(code, 5);
                }
                other => panic!("expected failure for {failing}, got {other:?}"),
            }
        }
    }
}
