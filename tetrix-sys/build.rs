use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
};

use cc::Build;

const CONFIG_FILE: &str = "tetrix.yaml";
const LOCAL_LIBRARY_DIR: &str = "c_libraries";

#[derive(Debug, serde::Deserialize)]
struct BindgenLists {
    pub allowlist_function: Vec<String>,
    pub allowlist_type: Vec<String>,
    pub allowlist_var: Vec<String>,
    pub blocklist_function: Vec<String>,
    pub blocklist_type: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    pub arduino_home: String,
    pub external_libraries_home: String,
    pub core_version: String,
    pub variant: Option<String>,
    pub avr_gcc_version: String,
    /// Libraries bundled with the AVR core, e.g. `Wire`.
    pub core_libraries: Vec<String>,
    /// Libraries installed in the sketchbook, e.g. `TETRIX_PRIZM`.
    pub external_libraries: Vec<String>,
    /// Sources under `c_libraries/`.
    pub local_library_files: Vec<String>,

    /// Headers handed to bindgen, looked up on the include path.
    pub headers: Vec<String>,

    pub definitions: HashMap<String, String>,
    pub flags: Vec<String>,

    pub bindgen_lists: BindgenLists,
}

impl Config {
    fn arduino_package_path(&self) -> PathBuf {
        let expanded = envmnt::expand(&self.arduino_home, None);
        PathBuf::from(&expanded).join("packages").join("arduino")
    }

    fn core_path(&self) -> PathBuf {
        self.arduino_package_path()
            .join("hardware")
            .join("avr")
            .join(&self.core_version)
    }

    fn avr_gcc_home(&self) -> PathBuf {
        self.arduino_package_path()
            .join("tools")
            .join("avr-gcc")
            .join(&self.avr_gcc_version)
    }

    fn avr_gcc(&self) -> PathBuf {
        self.avr_gcc_home().join("bin").join("avr-gcc")
    }

    fn arduino_core_path(&self) -> PathBuf {
        self.core_path().join("cores").join("arduino")
    }

    fn arduino_include_dirs(&self) -> Vec<PathBuf> {
        let variant_path = self
            .core_path()
            .join("variants")
            .join(self.variant.as_deref().unwrap_or("standard"));
        let avr_gcc_include_path = self.avr_gcc_home().join("avr").join("include");
        vec![self.arduino_core_path(), variant_path, avr_gcc_include_path]
    }

    fn core_libraries_path(&self) -> Vec<PathBuf> {
        let library_root = self.core_path().join("libraries");
        self.core_libraries
            .iter()
            .map(|lib| library_source_dir(&library_root.join(lib)))
            .collect()
    }

    fn external_libraries_path(&self) -> Vec<PathBuf> {
        let expanded = envmnt::expand(&self.external_libraries_home, None);
        let external_libraries_root = PathBuf::from(&expanded);
        self.external_libraries
            .iter()
            .map(|lib| library_source_dir(&external_libraries_root.join(lib)))
            .collect()
    }

    fn libraries_path(&self) -> Vec<PathBuf> {
        let mut libraries = self.core_libraries_path();
        libraries.extend(self.external_libraries_path());
        libraries
    }

    fn include_dirs(&self) -> Vec<PathBuf> {
        let mut include_dirs = self.arduino_include_dirs();
        include_dirs.extend(self.libraries_path());
        include_dirs.push(PathBuf::from(LOCAL_LIBRARY_DIR));
        include_dirs
    }

    /// Locate each configured header on the include path.
    fn header_paths(&self) -> Vec<PathBuf> {
        let include_dirs = self.include_dirs();
        self.headers
            .iter()
            .map(|header| {
                include_dirs
                    .iter()
                    .map(|dir| dir.join(header))
                    .find(|path| path.is_file())
                    .unwrap_or_else(|| panic!("Header {} not found on the include path", header))
            })
            .collect()
    }

    fn project_files(&self, pattern: &str) -> Vec<PathBuf> {
        let mut result = files_in_folder(&self.arduino_core_path(), pattern);

        let pattern = format!("**/{}", pattern);
        for library in self.libraries_path() {
            result.extend(files_in_folder(&library, &pattern));
        }

        result
    }

    fn local_files(&self, extension: &str) -> impl Iterator<Item = PathBuf> + '_ {
        let extension = extension.to_owned();
        self.local_library_files
            .iter()
            .filter(move |file| file.ends_with(&extension))
            .map(|file| PathBuf::from(LOCAL_LIBRARY_DIR).join(file))
    }

    fn cpp_files(&self) -> Vec<PathBuf> {
        let mut files = self.project_files("*.cpp");
        files.extend(self.local_files(".cpp"));
        files
    }

    fn c_files(&self) -> Vec<PathBuf> {
        let mut files = self.project_files("*.c");
        files.extend(self.local_files(".c"));
        files
    }
}

/// Newer library layouts keep their sources in `src/`, older ones in the root.
fn library_source_dir(library: &Path) -> PathBuf {
    let src = library.join("src");
    if src.is_dir() {
        src
    } else {
        library.to_path_buf()
    }
}

fn files_in_folder(folder: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = format!("{}/{pattern}", folder.to_string_lossy());
    glob::glob(&pattern)
        .unwrap_or_else(|e| panic!("Bad glob pattern {}: {}", pattern, e))
        .filter_map(Result::ok)
        .filter(|file| {
            !file.ends_with("main.cpp") && !file.to_string_lossy().as_ref().contains("example")
        })
        .collect()
}

fn configure_arduino(config: &Config) -> Build {
    let mut builder = Build::new();
    for (key, value) in &config.definitions {
        builder.define(key, value.as_str());
    }

    for flag in &config.flags {
        builder.flag(flag);
    }
    builder
        .compiler(config.avr_gcc())
        .flag("-Os")
        .cpp_set_stdlib(None)
        .flag("-fno-exceptions")
        .flag("-ffunction-sections")
        .flag("-fdata-sections");

    for include_dir in config.include_dirs() {
        builder.include(include_dir);
    }

    builder
}

fn configure_bindgen(config: &Config) -> bindgen::Builder {
    let mut builder = bindgen::Builder::default();
    for (key, value) in &config.definitions {
        builder = builder.clang_arg(format!("-D{}={}", key, value));
    }
    for flag in &config.flags {
        builder = builder.clang_arg(flag);
    }

    builder = builder
        .clang_args(["-x", "c++", "-std=gnu++11"])
        .size_t_is_usize(false)
        .use_core()
        .derive_default(true)
        .layout_tests(false)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()));

    for include_dir in config.include_dirs() {
        builder = builder.clang_arg(format!("-I{}", include_dir.to_string_lossy()));
    }
    for header in config.header_paths() {
        builder = builder.header(header.to_string_lossy());
    }

    let lists = &config.bindgen_lists;
    for item in &lists.allowlist_function {
        builder = builder.allowlist_function(item);
    }
    for item in &lists.allowlist_type {
        builder = builder.allowlist_type(item);
    }
    for item in &lists.allowlist_var {
        builder = builder.allowlist_var(item);
    }
    for item in &lists.blocklist_function {
        builder = builder.blocklist_function(item);
    }
    for item in &lists.blocklist_type {
        builder = builder.blocklist_type(item);
    }
    builder
}

fn add_source_file(builder: &mut Build, files: &[PathBuf]) {
    for file in files {
        println!("cargo:rerun-if-changed={}", file.to_string_lossy());
        builder.file(file);
    }
}

fn compile_arduino(config: &Config) {
    let mut builder = configure_arduino(config);
    builder
        .cpp(true)
        .flag("-std=gnu++11")
        .flag("-fpermissive")
        .flag("-fno-threadsafe-statics");
    add_source_file(&mut builder, &config.cpp_files());
    builder.compile("libtetrix_c++.a");

    let mut builder = configure_arduino(config);
    builder.flag("-std=gnu11");
    add_source_file(&mut builder, &config.c_files());
    builder.compile("libtetrix_c.a");
}

fn generate_bindings(config: &Config) {
    let bindings = configure_bindgen(config)
        .generate()
        .expect("Unable to generate bindings");
    let out_path = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    bindings
        .write_to_file(out_path.join("tetrix.rs"))
        .expect("Couldn't write bindings!");
}

fn main() {
    println!("cargo:rerun-if-changed={}", CONFIG_FILE);
    println!("cargo:rerun-if-changed={}", LOCAL_LIBRARY_DIR);

    // Host builds (tests, docs) get an empty crate.
    if env::var("CARGO_CFG_TARGET_ARCH").as_deref() != Ok("avr") {
        return;
    }

    let config_string = std::fs::read_to_string(CONFIG_FILE)
        .unwrap_or_else(|e| panic!("Unable to read {} file: {}", CONFIG_FILE, e));
    let config: Config = serde_yaml::from_str(&config_string)
        .unwrap_or_else(|e| panic!("Unable to parse {} file: {}", CONFIG_FILE, e));

    println!("Tetrix configuration: {:#?}", config);
    compile_arduino(&config);
    generate_bindings(&config);
}
