//! Scripted stand-ins for the hardware seams, shared by unit and integration
//! tests.

pub mod mocks;
