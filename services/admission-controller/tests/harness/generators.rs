// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for flood simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Forwarded chain as a proxy would append it: client first, then hops.
pub fn forwarded_chain(client: IpAddr, hops: usize) -> String {
    let mut chain = vec![client.to_string()];
    chain.extend((0..hops).map(|h| format!("172.16.0.{}", h + 1)));
    chain.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_forwarded_chain() {
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(forwarded_chain(ip, 2), "10.0.0.1, 172.16.0.1, 172.16.0.2");
    }
}
