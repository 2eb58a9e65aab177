mod payment;
mod registration;
mod school;
mod workshop;

pub use payment::*;
pub use registration::*;
pub use school::*;
pub use workshop::*;
