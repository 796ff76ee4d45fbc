use std::fs;
use std::path::Path;

use hex_literal::hex;
use tempfile::TempDir;

use krz::artifacts::{self, MemSource};
use krz::image::{self, ImageSizeLimit};
use krz::{Error, PackedImage};

/// Writes `data` to `name` inside `dir` and returns its path
fn write_program(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, data).unwrap();

    path
}

#[test]
fn it_should_write_the_flash_and_memory_images() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "krz_blinky.bin", &hex!("01 02 03 04 05 06 07 08"));

    let raw = artifacts::read_image(&input).unwrap();
    let built = artifacts::build(&raw, ImageSizeLimit::default(), Some(MemSource::Raw)).unwrap();
    let paths = artifacts::write_artifacts(&input, &built, None).unwrap();

    assert_eq!(paths.flash, dir.path().join("krz_blinky.krz.bin"));
    assert_eq!(paths.mem, Some(dir.path().join("krz_blinky.mem")));

    assert_eq!(
        fs::read(&paths.flash).unwrap(),
        hex!("08 00 00 00 01 02 03 04 05 06 07 08")
    );
    assert_eq!(
        fs::read_to_string(paths.mem.unwrap()).unwrap(),
        "04030201\n08070605\n"
    );
}

#[test]
fn it_should_write_into_an_output_directory() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = write_program(&dir, "app.bin", &hex!("13 00 00 00"));

    let raw = artifacts::read_image(&input).unwrap();
    let built = artifacts::build(&raw, ImageSizeLimit::default(), Some(MemSource::Packed)).unwrap();
    let paths = artifacts::write_artifacts(&input, &built, Some(out.path())).unwrap();

    assert_eq!(paths.flash, out.path().join("app.krz.bin"));
    assert_eq!(paths.mem, Some(out.path().join("app.krz.mem")));
    assert_eq!(
        fs::read_to_string(out.path().join("app.krz.mem")).unwrap(),
        "00000004\n00000013\n"
    );
}

#[test]
fn it_should_not_write_anything_for_an_invalid_program() {
    let dir = TempDir::new().unwrap();
    let input = write_program(&dir, "broken.bin", &[0u8; 10]);

    let raw = artifacts::read_image(&input).unwrap();
    let err = artifacts::build(&raw, ImageSizeLimit::default(), Some(MemSource::Raw)).unwrap_err();

    match err {
        Error::PreconditionViolated(err) => assert!(err.is_misaligned()),
        err => panic!("unexpected error: {}", err),
    }

    assert!(!dir.path().join("broken.krz.bin").exists());
    assert!(!dir.path().join("broken.mem").exists());
}

#[test]
fn it_should_read_back_a_written_flash_image() {
    let dir = TempDir::new().unwrap();
    let program: Vec<u8> = (0..64).collect();
    let input = write_program(&dir, "prog.bin", &program);

    let built = artifacts::build(&program, ImageSizeLimit::default(), None).unwrap();
    let paths = artifacts::write_artifacts(&input, &built, None).unwrap();
    assert_eq!(paths.mem, None);

    let file = fs::File::open(&paths.flash).unwrap();
    let packed = PackedImage::from_reader(file, ImageSizeLimit::default()).unwrap();

    assert_eq!(packed.payload(), &program[..]);
    assert_eq!(packed, built.flash);
}

#[test]
fn it_should_convert_a_program_to_a_memory_image_without_a_size_limit() {
    let dir = TempDir::new().unwrap();
    let program = vec![0x5Au8; 256 * 1024];
    let input = write_program(&dir, "large.bin", &program);

    let path = artifacts::write_mem_image(Path::new(&input), &program, None).unwrap();
    let text = fs::read_to_string(&path).unwrap();

    assert_eq!(path, dir.path().join("large.mem"));
    assert_eq!(text.lines().count(), program.len() / 4);
    assert_eq!(image::parse(&text).unwrap(), program);
}

#[test]
fn it_should_fail_to_read_a_missing_program() {
    let dir = TempDir::new().unwrap();
    let err = artifacts::read_image(dir.path().join("missing.bin")).unwrap_err();

    assert!(matches!(err, Error::IoError(_)));
}
