//! Subsystem claim sets.
//!
//! A claim set declares which shared subsystems a command exclusively
//! owns while it runs. The scheduler's claim table is the whole mutual
//! exclusion mechanism — there is only one thread, so no locks, but at
//! most one running command may hold any subsystem bit at a time.
//!
//! Bit assignments belong to the application: the robot crate defines one
//! constant per subsystem via [`ClaimSet::single`].

use bitflags::bitflags;

bitflags! {
    /// Set of exclusively-claimed subsystems, one bit each.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClaimSet: u32 {
        // Bits are defined by the application, not here.
        const _ = !0;
    }
}

impl ClaimSet {
    /// Claim set holding only subsystem bit `bit` (0–31).
    pub const fn single(bit: u32) -> Self {
        Self::from_bits_retain(1 << bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVE: ClaimSet = ClaimSet::single(0);
    const ARM: ClaimSet = ClaimSet::single(1);

    #[test]
    fn distinct_bits_do_not_conflict() {
        assert!(!DRIVE.intersects(ARM));
        assert!(DRIVE.intersects(DRIVE));
    }

    #[test]
    fn union_conflicts_with_each_member() {
        let both = DRIVE | ARM;
        assert!(both.intersects(DRIVE));
        assert!(both.intersects(ARM));
    }

    #[test]
    fn empty_set_never_conflicts() {
        assert!(!ClaimSet::empty().intersects(DRIVE));
        assert!(!DRIVE.intersects(ClaimSet::empty()));
    }
}
