pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod origin;
pub use self::origin::OriginResolver;

pub mod throttle;
pub use self::throttle::RequestThrottle;

pub mod types;
