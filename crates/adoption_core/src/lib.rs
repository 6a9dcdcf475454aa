pub mod domain;
pub mod ports;

pub use domain::{
    Animal, AnimalSize, AuthSnapshot, Message, RemoteUser, Sender, Sex, Species, User, UserPatch,
    UserType,
};
pub use ports::{
    Alert, AlertKind, AnimalSource, AuthApi, KeyValueStore, Navigator, PortError, PortResult,
    Presenter,
};
