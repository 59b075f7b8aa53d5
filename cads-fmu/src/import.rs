//! Import is responsible for extracting the FMU archive, detecting its
//! standard version and parsing the model description XML.
//!
//! Each import owns its scratch directory; dropping the import removes the
//! extracted tree on every exit path.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use cads_schema::{MajorVersion, fmi2, fmi3, minimal::MinimalModelDescription};

use crate::Error;

const MODEL_DESCRIPTION: &str = "modelDescription.xml";
const SCRATCH_PREFIX: &str = "cads-fmu";

/// Peek at the model description without extracting the archive.
pub fn peek_model_description(path: &Path) -> Result<MinimalModelDescription, Error> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut descr_file = archive
        .by_name(MODEL_DESCRIPTION)
        .map_err(|e| Error::ArchiveStructure(e.to_string()))?;
    let mut descr_xml = String::new();
    descr_file.read_to_string(&mut descr_xml)?;
    MinimalModelDescription::from_str(&descr_xml).map_err(Error::from)
}

/// Extract the archive into a fresh scratch directory and read the model
/// description XML out of it.
fn extract(path: &Path) -> Result<(tempfile::TempDir, String), Error> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let dir = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
    log::debug!("extracting {} into {:?}", path.display(), dir.path());
    archive.extract(&dir)?;
    let descr_xml = std::fs::read_to_string(dir.path().join(MODEL_DESCRIPTION))?;
    Ok((dir, descr_xml))
}

/// An extracted FMU of either supported standard version.
#[derive(Debug)]
pub enum FmuImport {
    Fmi2(Fmi2Import),
    Fmi3(Fmi3Import),
}

/// Classify and extract the FMU at `path`.
pub fn from_path(path: &Path) -> Result<FmuImport, Error> {
    let minimal = peek_model_description(path)?;
    log::debug!(
        "found FMI {} FMU named '{}'",
        minimal.fmi_version,
        minimal.model_name
    );
    let version = minimal
        .major_version()
        .map_err(|_| Error::UnsupportedFmiVersion(minimal.fmi_version.clone()))?;
    match version {
        MajorVersion::Fmi2 => Fmi2Import::from_path(path).map(FmuImport::Fmi2),
        MajorVersion::Fmi3 => Fmi3Import::from_path(path).map(FmuImport::Fmi3),
    }
}

/// FMU import for FMI 2.0.
#[derive(Debug)]
pub struct Fmi2Import {
    /// Scratch directory holding the unzipped FMU.
    dir: tempfile::TempDir,
    model_description: fmi2::Fmi2ModelDescription,
}

impl Fmi2Import {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let (dir, descr_xml) = extract(path)?;
        let model_description = fmi2::Fmi2ModelDescription::from_str(&descr_xml)?;
        Ok(Self {
            dir,
            model_description,
        })
    }

    pub fn model_description(&self) -> &fmi2::Fmi2ModelDescription {
        &self.model_description
    }

    /// Path of the platform shared library inside the extracted archive.
    pub fn shared_lib_path(&self, model_identifier: &str) -> Result<PathBuf, Error> {
        let platform_folder = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("windows", "x86_64") => "win64",
            ("windows", "x86") => "win32",
            ("linux", "x86_64") => "linux64",
            ("linux", "x86") => "linux32",
            ("macos", "x86_64" | "aarch64") => "darwin64",
            _ => {
                return Err(Error::UnsupportedPlatform {
                    os: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                });
            }
        };
        let fname = format!("{model_identifier}{}", std::env::consts::DLL_SUFFIX);
        Ok(self
            .dir
            .path()
            .join("binaries")
            .join(platform_folder)
            .join(fname))
    }

    /// The resource location handed to `fmi2Instantiate`, an IETF URI per
    /// the FMI 2.0 standard.
    pub fn resource_url(&self) -> String {
        let resource_path = std::path::absolute(self.dir.path().join("resources"))
            .expect("Invalid resource path");
        url::Url::from_file_path(resource_path)
            .map(|url| url.as_str().to_owned())
            .expect("Error converting path to URL")
    }
}

/// FMU import for FMI 3.0.
#[derive(Debug)]
pub struct Fmi3Import {
    /// Scratch directory holding the unzipped FMU.
    dir: tempfile::TempDir,
    model_description: fmi3::Fmi3ModelDescription,
}

impl Fmi3Import {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let (dir, descr_xml) = extract(path)?;
        let model_description = fmi3::Fmi3ModelDescription::from_str(&descr_xml)?;
        Ok(Self {
            dir,
            model_description,
        })
    }

    pub fn model_description(&self) -> &fmi3::Fmi3ModelDescription {
        &self.model_description
    }

    pub fn shared_lib_path(&self, model_identifier: &str) -> Result<PathBuf, Error> {
        let platform_folder = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("windows", "x86_64") => "x86_64-windows",
            ("windows", "x86") => "x86-windows",
            ("linux", "x86_64") => "x86_64-linux",
            ("linux", "aarch64") => "aarch64-linux",
            ("linux", "x86") => "x86-linux",
            ("macos", "x86_64") => "x86_64-darwin",
            ("macos", "aarch64") => "aarch64-darwin",
            _ => {
                return Err(Error::UnsupportedPlatform {
                    os: std::env::consts::OS.to_string(),
                    arch: std::env::consts::ARCH.to_string(),
                });
            }
        };
        let fname = format!("{model_identifier}{}", std::env::consts::DLL_SUFFIX);
        Ok(self
            .dir
            .path()
            .join("binaries")
            .join(platform_folder)
            .join(fname))
    }

    /// The resource path handed to `fmi3InstantiateCoSimulation`; FMI 3.0
    /// uses a plain absolute path instead of a URI.
    pub fn resource_path(&self) -> String {
        std::path::absolute(self.dir.path().join("resources"))
            .expect("Invalid resource path")
            .to_str()
            .expect("Invalid resource path")
            .to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fmu_with(descr: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        {
            let mut archive = zip::ZipWriter::new(file.as_file_mut());
            archive
                .start_file(MODEL_DESCRIPTION, zip::write::FileOptions::default())
                .unwrap();
            archive.write_all(descr.as_bytes()).unwrap();
            archive.finish().unwrap();
        }
        file
    }

    const FMI2_DESCR: &str = r#"
        <fmiModelDescription fmiVersion="2.0" modelName="Identity" guid="g">
          <CoSimulation modelIdentifier="identity"/>
          <ModelVariables/>
        </fmiModelDescription>"#;

    #[test]
    fn peeks_without_extracting() {
        let fmu = fmu_with(FMI2_DESCR);
        let minimal = peek_model_description(fmu.path()).unwrap();
        assert_eq!(minimal.model_name, "Identity");
        assert_eq!(minimal.major_version().unwrap(), MajorVersion::Fmi2);
    }

    #[test]
    fn imports_fmi2() {
        let fmu = fmu_with(FMI2_DESCR);
        match from_path(fmu.path()).unwrap() {
            FmuImport::Fmi2(import) => {
                assert_eq!(import.model_description().model_name, "Identity");
            }
            FmuImport::Fmi3(_) => panic!("expected an FMI 2.0 import"),
        }
    }

    #[test]
    fn imports_fmi3() {
        let fmu = fmu_with(
            r#"<fmiModelDescription fmiVersion="3.0" modelName="M" instantiationToken="t">
                 <CoSimulation modelIdentifier="m"/>
                 <ModelVariables/>
               </fmiModelDescription>"#,
        );
        assert!(matches!(
            from_path(fmu.path()).unwrap(),
            FmuImport::Fmi3(_)
        ));
    }

    #[test]
    fn rejects_fmi1() {
        let fmu = fmu_with(r#"<fmiModelDescription fmiVersion="1.0" modelName="Old"/>"#);
        assert!(matches!(
            from_path(fmu.path()),
            Err(Error::UnsupportedFmiVersion(v)) if v == "1.0"
        ));
    }

    #[test]
    fn rejects_archive_without_model_description() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        {
            let mut archive = zip::ZipWriter::new(file.as_file_mut());
            archive
                .start_file("other.txt", zip::write::FileOptions::default())
                .unwrap();
            archive.write_all(b"hi").unwrap();
            archive.finish().unwrap();
        }
        assert!(matches!(
            peek_model_description(file.path()),
            Err(Error::ArchiveStructure(_))
        ));
    }

    #[test]
    fn rejects_non_zip_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a zip archive").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            peek_model_description(file.path()),
            Err(Error::Zip(_))
        ));
    }
}
