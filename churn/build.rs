use common::yaml_include::load_yaml_with_includes;
use std::{error::Error, fs, io::Write, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=config");
    println!("cargo:rerun-if-env-changed=CHURN_ENV");

    let env = std::env::var("CHURN_ENV").unwrap_or_else(|_| "dev".to_string());
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    // OUT_DIR is <target>/<profile>/build/<pkg>-<hash>/out
    let Some(profile_dir) = out_dir.ancestors().nth(3) else {
        println!("cargo:warning=Unexpected OUT_DIR layout {:?}, config not assembled", out_dir);
        return Ok(());
    };

    let source = manifest_dir.join("config").join(format!("{}.yaml", env));
    println!("cargo:warning=Assembling config env {:?} from {:?}", env, source);
    let config_yaml = load_yaml_with_includes(&source)?;

    let mut out_str = String::new();
    {
        let mut emitter = yaml_rust2::YamlEmitter::new(&mut out_str);
        emitter.dump(&config_yaml)?;
    }

    let total_config_dir = profile_dir.join("config");
    let total_config_file_name = total_config_dir.join("total_config.yaml");
    fs::create_dir_all(&total_config_dir)?;
    fs::File::create(&total_config_file_name)?.write_all(out_str.as_bytes())?;

    Ok(())
}
