use std::process;
use std::str::FromStr;

use clap::{arg, ArgMatches, Command};

use cryptocompare::block::to_block;
use cryptocompare::codec::hex_decode;
use cryptocompare::error::CipherError;
use cryptocompare::key_schedule::Direction;
use cryptocompare::trace::{trace_des, trace_triple_des};
use cryptocompare::{Algorithm, CipherService, Encoding, Encrypted, KeyMaterial, Mode};

const USAGE_EXIT_CODE: i32 = 2;

fn exit_code(e: &CipherError) -> i32 {
    match e {
        CipherError::KeyLength { .. } => 3,
        CipherError::Format(_) => 4,
        CipherError::Padding(_) => 5,
        CipherError::Encoding(_) => 6
    }
}

fn fail(e: CipherError) -> ! {
    eprintln!("Error: {}", e);
    process::exit(exit_code(&e));
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    match matches.value_of(name) {
        Some(v) => v,
        None => {
            eprintln!("Missing argument {}", name);
            process::exit(USAGE_EXIT_CODE);
        }
    }
}

fn parse_option<T: FromStr<Err = String>>(matches: &ArgMatches, name: &str) -> T {
    match required(matches, name).parse() {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(USAGE_EXIT_CODE);
        }
    }
}

fn print_encrypted(encrypted: &Encrypted) {
    println!("{} {}", encrypted.algorithm, encrypted.mode);
    println!("  ciphertext: {}", encrypted.ciphertext);
    if let Some(iv) = &encrypted.iv {
        println!("  iv: {}", iv);
    }
    println!("  elapsed: {}us", encrypted.elapsed_micros());
}

fn keygen(service: &mut CipherService, matches: &ArgMatches) {
    let bits: usize = match required(matches, "bits").parse() {
        Ok(b) => b,
        Err(_) => {
            eprintln!("Key size must be a number of bits");
            process::exit(USAGE_EXIT_CODE);
        }
    };

    let algorithm = match Algorithm::from_key_bits(bits) {
        Some(a) => a,
        None => {
            eprintln!("Unsupported key size {} - expected 64 or 192", bits);
            process::exit(USAGE_EXIT_CODE);
        }
    };

    log::info!("generating {} key: {} bits, {} effective", algorithm, algorithm.key_bits(), algorithm.effective_key_bits());
    println!("{}", service.generate_key_hex(algorithm).as_str());
}

fn encrypt(service: &mut CipherService, matches: &ArgMatches) {
    let algorithm: Algorithm = parse_option(matches, "algorithm");
    let mode: Mode = parse_option(matches, "mode");
    let encoding: Encoding = parse_option(matches, "encoding");

    let result = service.encrypt_text(required(matches, "plaintext"), required(matches, "key"), algorithm, mode, encoding);
    match result {
        Ok(encrypted) => print_encrypted(&encrypted),
        Err(e) => fail(e)
    }
}

fn decrypt(service: &CipherService, matches: &ArgMatches) {
    let algorithm: Algorithm = parse_option(matches, "algorithm");
    let mode: Mode = parse_option(matches, "mode");
    let encoding: Encoding = parse_option(matches, "encoding");

    let result = service.decrypt_text(
        required(matches, "ciphertext"),
        required(matches, "key"),
        algorithm,
        mode,
        encoding,
        matches.value_of("iv"));

    match result {
        Ok(plaintext) => println!("{}", plaintext),
        Err(e) => fail(e)
    }
}

fn compare(service: &mut CipherService, matches: &ArgMatches) {
    let mode: Mode = parse_option(matches, "mode");
    let encoding: Encoding = parse_option(matches, "encoding");

    let result = service.compare(
        required(matches, "plaintext"),
        required(matches, "des_key"),
        required(matches, "triple_key"),
        mode,
        encoding);

    match result {
        Ok(comparison) => {
            print_encrypted(&comparison.des);
            print_encrypted(&comparison.triple_des);

            let des_micros = comparison.des.elapsed_micros().max(1);
            println!("3DES/DES time ratio: {:.2}", comparison.triple_des.elapsed_micros() as f64 / des_micros as f64);
        },
        Err(e) => fail(e)
    }
}

fn trace(matches: &ArgMatches) {
    let algorithm: Algorithm = parse_option(matches, "algorithm");
    let direction = if matches.is_present("decrypt") { Direction::Decrypt } else { Direction::Encrypt };

    let key = KeyMaterial::from_hex(algorithm, required(matches, "key")).unwrap_or_else(|e| fail(e));
    let block = hex_decode(required(matches, "block"))
        .and_then(|bytes| to_block(&bytes))
        .unwrap_or_else(|e| fail(e));

    let passes = match &key {
        KeyMaterial::Des(k) => trace_des(&block, k, direction),
        KeyMaterial::TripleDes(k) => trace_triple_des(&block, k, direction)
    };

    for pass in passes.iter() {
        println!("{}", pass);
    }
}

fn cipher_options(command: Command<'static>) -> Command<'static> {
    command
        .arg(arg!(-m --mode <MODE> "Chaining mode: ECB or CBC").required(false).default_value("CBC"))
        .arg(arg!(-e --encoding <ENCODING> "Text encoding of ciphertext and IV: hex or base64").required(false).default_value("hex"))
}

fn algorithm_option(command: Command<'static>) -> Command<'static> {
    command.arg(arg!(-a --algorithm <ALGORITHM> "Cipher: des or 3des").required(false).default_value("des"))
}

pub fn main() {
    env_logger::init();

    let matches = Command::new("des")
        .about("Encrypt and decrypt text with DES and Triple DES")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("keygen")
            .about("Generate a random key")
            .arg(arg!(-b --bits <BITS> "Key size: 64 for DES or 192 for 3DES").required(false).default_value("64")))
        .subcommand(algorithm_option(cipher_options(Command::new("encrypt")
            .about("Encrypt UTF-8 text")
            .arg(arg!([key] "The key as hex").required(true))
            .arg(arg!([plaintext] "The plaintext to encrypt").required(true)))))
        .subcommand(algorithm_option(cipher_options(Command::new("decrypt")
            .about("Decrypt ciphertext back to UTF-8 text")
            .arg(arg!([key] "The key as hex").required(true))
            .arg(arg!([ciphertext] "The ciphertext to decrypt").required(true))
            .arg(arg!(--iv <IV> "The IV printed by encrypt, required for CBC").required(false)))))
        .subcommand(cipher_options(Command::new("compare")
            .about("Encrypt the same text with DES and 3DES")
            .arg(arg!([des_key] "The DES key as hex").required(true))
            .arg(arg!([triple_key] "The 3DES key as hex").required(true))
            .arg(arg!([plaintext] "The plaintext to encrypt").required(true))))
        .subcommand(algorithm_option(Command::new("trace")
            .about("Show every round of a single block")
            .arg(arg!([key] "The key as hex").required(true))
            .arg(arg!([block] "An 8-byte block as hex").required(true))
            .arg(arg!(--decrypt "Trace decryption instead of encryption"))))
        .get_matches();

    let mut service = CipherService::new();

    match matches.subcommand() {
        Some(("keygen", sub)) => keygen(&mut service, sub),
        Some(("encrypt", sub)) => encrypt(&mut service, sub),
        Some(("decrypt", sub)) => decrypt(&service, sub),
        Some(("compare", sub)) => compare(&mut service, sub),
        Some(("trace", sub)) => trace(sub),
        _ => {
            eprintln!("Expected one of keygen, encrypt, decrypt, compare or trace");
            process::exit(USAGE_EXIT_CODE);
        }
    }
}
