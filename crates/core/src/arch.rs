// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use bitflags::bitflags;

bitflags! {
    /// Architecture versions an encoding is valid for.
    ///
    /// The single-version flags ascend with the architecture, so the numeric
    /// value of one flag orders versions (`ArchVersion() >= ARMv5T` is
    /// `version.bits() >= ArmVariants::ARMV5T.bits()`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArmVariants: u32 {
        const ARMV4 = 1 << 0;
        const ARMV4T = 1 << 1;
        const ARMV5T = 1 << 2;
        const ARMV5TE = 1 << 3;
        const ARMV5TEJ = 1 << 4;
        const ARMV6 = 1 << 5;
        const ARMV6K = 1 << 6;
        const ARMV6T2 = 1 << 7;
        const ARMV7 = 1 << 8;
        const ARMV8 = 1 << 9;

        const ARMV4T_ABOVE = Self::ARMV4T.bits()
            | Self::ARMV5T.bits()
            | Self::ARMV5TE.bits()
            | Self::ARMV5TEJ.bits()
            | Self::ARMV6.bits()
            | Self::ARMV6K.bits()
            | Self::ARMV6T2.bits()
            | Self::ARMV7.bits()
            | Self::ARMV8.bits();
        const ARMV5_ABOVE = Self::ARMV5T.bits()
            | Self::ARMV5TE.bits()
            | Self::ARMV5TEJ.bits()
            | Self::ARMV6.bits()
            | Self::ARMV6K.bits()
            | Self::ARMV6T2.bits()
            | Self::ARMV7.bits()
            | Self::ARMV8.bits();
        const ARMV6T2_ABOVE = Self::ARMV6T2.bits() | Self::ARMV7.bits() | Self::ARMV8.bits();
        const ALL = 0xffff_ffff;
    }
}

impl ArmVariants {
    /// Maps an architecture name or target triple to its single-version flag.
    ///
    /// Only the component before the first `-` is considered and the match is
    /// case-insensitive. `thumbvN` spellings map to the matching `armvN`.
    pub fn from_arch_name(name: &str) -> Option<ArmVariants> {
        let arch = name.split('-').next().unwrap_or_default().to_ascii_lowercase();
        let arch = match arch.strip_prefix("thumb") {
            Some(rest) => format!("arm{rest}"),
            None => arch,
        };
        let version = match arch.as_str() {
            "armv4" => ArmVariants::ARMV4,
            "armv4t" => ArmVariants::ARMV4T,
            "armv5t" => ArmVariants::ARMV5T,
            "armv5te" => ArmVariants::ARMV5TE,
            "armv5tej" => ArmVariants::ARMV5TEJ,
            "armv6" => ArmVariants::ARMV6,
            "armv6k" => ArmVariants::ARMV6K,
            "armv6t2" => ArmVariants::ARMV6T2,
            // profile and core suffixes (armv7a, armv7m, armv7em, armv7s, ...)
            a if a.starts_with("armv7") => ArmVariants::ARMV7,
            a if a.starts_with("armv8") => ArmVariants::ARMV8,
            _ => return None,
        };
        Some(version)
    }

    /// Whether a table row marked with `self` is valid on `version`.
    pub fn supports(self, version: ArmVariants) -> bool {
        self.intersects(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(ArmVariants::from_arch_name("ARMv7"), Some(ArmVariants::ARMV7));
        assert_eq!(ArmVariants::from_arch_name("armv4t"), Some(ArmVariants::ARMV4T));
        assert_eq!(ArmVariants::from_arch_name("ArmV5TEJ"), Some(ArmVariants::ARMV5TEJ));
        assert_eq!(ArmVariants::from_arch_name("armv6t2"), Some(ArmVariants::ARMV6T2));
    }

    #[test]
    fn test_triples_and_aliases() {
        assert_eq!(
            ArmVariants::from_arch_name("armv7-apple-ios"),
            Some(ArmVariants::ARMV7)
        );
        assert_eq!(
            ArmVariants::from_arch_name("thumbv7em-none-eabihf"),
            Some(ArmVariants::ARMV7)
        );
        assert_eq!(ArmVariants::from_arch_name("thumbv6"), Some(ArmVariants::ARMV6));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(ArmVariants::from_arch_name("x86_64"), None);
        assert_eq!(ArmVariants::from_arch_name(""), None);
        assert_eq!(ArmVariants::from_arch_name("armv9"), None);
    }

    #[test]
    fn test_variant_sets() {
        assert!(ArmVariants::ARMV5_ABOVE.supports(ArmVariants::ARMV7));
        assert!(!ArmVariants::ARMV5_ABOVE.supports(ArmVariants::ARMV4T));
        assert!(ArmVariants::ARMV6T2_ABOVE.supports(ArmVariants::ARMV8));
        assert!(!ArmVariants::ARMV6T2_ABOVE.supports(ArmVariants::ARMV6K));
        assert!(ArmVariants::ALL.supports(ArmVariants::ARMV4));
        assert!(ArmVariants::ARMV7.bits() > ArmVariants::ARMV5T.bits());
    }
}
