pub mod cause;
pub mod protocol_discriminator;
