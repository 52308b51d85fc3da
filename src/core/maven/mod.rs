mod artifact;

pub use artifact::MavenArtifact;

pub const FABRIC_MAVEN: &str = "https://maven.fabricmc.net";
