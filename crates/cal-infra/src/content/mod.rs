mod directory_launcher;

pub use directory_launcher::DirectoryContentLauncher;
