//! IPv4 interface enumeration.

use crate::DataLinkError;
use std::net::Ipv4Addr;

/// One IPv4 address assigned to a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceInfo {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
}

impl InterfaceInfo {
    pub fn new(name: impl Into<String>, address: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address,
            netmask,
            broadcast: directed_broadcast(address, netmask),
        }
    }
}

/// Host bits all set: `ip | !mask`.
pub fn directed_broadcast(ip: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(ip) | !u32::from(mask))
}

/// Every IPv4 address on every interface, in the order the OS reports them.
#[cfg(unix)]
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>, DataLinkError> {
    use std::ffi::CStr;

    let mut out = Vec::new();
    let mut ifaddrs: *mut libc::ifaddrs = std::ptr::null_mut();

    // SAFETY:
    // - `ifaddrs` is a valid pointer to a null pointer, which getifaddrs will populate
    // - The returned list is freed with freeifaddrs before returning
    let ret = unsafe { libc::getifaddrs(&mut ifaddrs) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    let mut ifa = ifaddrs;
    while !ifa.is_null() {
        // SAFETY:
        // - `ifa` is non-null and points into the list returned by getifaddrs
        // - The list stays valid until freeifaddrs below
        let entry = unsafe { &*ifa };
        ifa = entry.ifa_next;

        if entry.ifa_addr.is_null() || entry.ifa_netmask.is_null() {
            continue;
        }
        // SAFETY: `ifa_addr` was checked non-null; only sa_family is read
        let family = unsafe { (*entry.ifa_addr).sa_family };
        if i32::from(family) != libc::AF_INET {
            continue;
        }

        // SAFETY:
        // - sa_family == AF_INET guarantees both sockaddrs are sockaddr_in
        // - `ifa_name` is NUL-terminated and valid for the list's lifetime
        let (name, address, netmask) = unsafe {
            let addr = (*(entry.ifa_addr as *const libc::sockaddr_in)).sin_addr.s_addr;
            let mask = (*(entry.ifa_netmask as *const libc::sockaddr_in))
                .sin_addr
                .s_addr;
            (
                CStr::from_ptr(entry.ifa_name)
                    .to_string_lossy()
                    .into_owned(),
                Ipv4Addr::from(u32::from_be(addr)),
                Ipv4Addr::from(u32::from_be(mask)),
            )
        };
        out.push(InterfaceInfo::new(name, address, netmask));
    }

    // SAFETY: `ifaddrs` is the list returned by getifaddrs and is freed once
    unsafe { libc::freeifaddrs(ifaddrs) };

    Ok(out)
}

#[cfg(not(unix))]
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>, DataLinkError> {
    Ok(Vec::new())
}

/// The first IPv4 address of the interface called `name`.
pub fn find_interface(name: &str) -> Result<InterfaceInfo, DataLinkError> {
    select_interface(list_interfaces()?, name)
}

fn select_interface(
    interfaces: Vec<InterfaceInfo>,
    name: &str,
) -> Result<InterfaceInfo, DataLinkError> {
    interfaces
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| {
            if interface_exists(name) {
                DataLinkError::NoIpv4Address(name.to_string())
            } else {
                DataLinkError::InterfaceNotFound(name.to_string())
            }
        })
}

#[cfg(unix)]
fn interface_exists(name: &str) -> bool {
    let Ok(cname) = std::ffi::CString::new(name) else {
        return false;
    };
    // SAFETY: `cname` is a valid NUL-terminated string
    unsafe { libc::if_nametoindex(cname.as_ptr()) != 0 }
}

#[cfg(not(unix))]
fn interface_exists(_name: &str) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::{directed_broadcast, select_interface, InterfaceInfo};
    use crate::DataLinkError;
    use std::net::Ipv4Addr;

    #[test]
    fn broadcast_sets_host_bits() {
        assert_eq!(
            directed_broadcast(Ipv4Addr::new(192, 168, 1, 20), Ipv4Addr::new(255, 255, 255, 0)),
            Ipv4Addr::new(192, 168, 1, 255)
        );
        assert_eq!(
            directed_broadcast(Ipv4Addr::new(10, 4, 7, 1), Ipv4Addr::new(255, 255, 0, 0)),
            Ipv4Addr::new(10, 4, 255, 255)
        );
    }

    #[test]
    fn select_by_name() {
        let ifaces = vec![
            InterfaceInfo::new("lo", Ipv4Addr::LOCALHOST, Ipv4Addr::new(255, 0, 0, 0)),
            InterfaceInfo::new(
                "eth0",
                Ipv4Addr::new(192, 168, 1, 20),
                Ipv4Addr::new(255, 255, 255, 0),
            ),
        ];
        let eth0 = select_interface(ifaces.clone(), "eth0").unwrap();
        assert_eq!(eth0.broadcast, Ipv4Addr::new(192, 168, 1, 255));

        let err = select_interface(ifaces, "bacflow-missing0").unwrap_err();
        assert!(
            matches!(err, DataLinkError::InterfaceNotFound(name) if name == "bacflow-missing0")
        );
    }

    #[cfg(unix)]
    #[test]
    fn listing_includes_loopback() {
        let ifaces = super::list_interfaces().unwrap();
        assert!(ifaces.iter().any(|i| i.address.is_loopback()));
    }
}
