/// Client-credentials token acquisition for the Dataverse Web API.
pub mod credentials;
