use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use proptest::prelude::*;
use stx_custody::tx::build_unsigned;
use stx_custody::wallet::{format_stx, parse_stx};
use stx_custody::{
    normalize, pre_sign_digest, DigestAlgorithm, Network, SignatureComponents, StacksAddress,
    TransferIntent,
};

const SENDER_PK: &str = "0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
const RECIPIENT: &str = "ST2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQYAC0RQ";

fn intent(amount: u64, fee: u64, nonce: u64) -> TransferIntent {
    TransferIntent::new(SENDER_PK, RECIPIENT, amount, Network::Testnet)
        .with_fee(fee)
        .with_nonce(nonce)
}

fn any_algorithm() -> impl Strategy<Value = DigestAlgorithm> {
    prop_oneof![Just(DigestAlgorithm::Sha256), Just(DigestAlgorithm::Sha512_256)]
}

proptest! {
    #[test]
    fn digests_are_deterministic(
        amount in 1u64..,
        fee in any::<u64>(),
        nonce in any::<u64>(),
        algorithm in any_algorithm(),
    ) {
        let first = build_unsigned(&intent(amount, fee, nonce)).unwrap();
        let second = build_unsigned(&intent(amount, fee, nonce)).unwrap();
        prop_assert_eq!(first.serialize(), second.serialize());

        let a = pre_sign_digest(first.transaction(), algorithm).unwrap();
        let b = pre_sign_digest(second.transaction(), algorithm).unwrap();
        prop_assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn fee_and_nonce_are_bound_into_the_digest(
        fee in 0u64..u64::MAX,
        nonce in 0u64..u64::MAX,
    ) {
        let digest = |fee, nonce| {
            let unsigned = build_unsigned(&intent(1_000, fee, nonce)).unwrap();
            pre_sign_digest(unsigned.transaction(), DigestAlgorithm::Sha256).unwrap()
        };
        let base = digest(fee, nonce);

        let bumped_fee = digest(fee + 1, nonce);
        prop_assert_eq!(base.base_sig_hash, bumped_fee.base_sig_hash);
        prop_assert_ne!(base.digest, bumped_fee.digest);

        let bumped_nonce = digest(fee, nonce + 1);
        prop_assert_eq!(base.base_sig_hash, bumped_nonce.base_sig_hash);
        prop_assert_ne!(base.digest, bumped_nonce.digest);
    }

    #[test]
    fn split_signatures_keep_v_r_s_order(
        v in 0u64..4,
        r in prop::array::uniform32(any::<u8>()),
        s in prop::array::uniform32(any::<u8>()),
    ) {
        let compact = normalize(&SignatureComponents::split(v, hex::encode(r), hex::encode(s))).unwrap();
        let bytes = compact.as_bytes();
        prop_assert_eq!(bytes[0] as u64, v);
        prop_assert_eq!(&bytes[1..33], &r[..]);
        prop_assert_eq!(&bytes[33..], &s[..]);

        let offset = normalize(&SignatureComponents::split(v + 27, hex::encode(r), hex::encode(s))).unwrap();
        prop_assert_eq!(offset, compact);
    }

    #[test]
    fn normalizing_is_idempotent(
        v in 0u64..4,
        r in prop::array::uniform32(any::<u8>()),
        s in prop::array::uniform32(any::<u8>()),
    ) {
        let once = normalize(&SignatureComponents::split(v, hex::encode(r), hex::encode(s))).unwrap();
        let twice = normalize(&SignatureComponents::compact(once.to_hex())).unwrap();
        prop_assert_eq!(once, twice);

        let from_base64 = normalize(&SignatureComponents::base64(STANDARD.encode(once.as_bytes()))).unwrap();
        prop_assert_eq!(once, from_base64);
    }

    #[test]
    fn short_scalars_are_left_padded(v in 0u64..4, r in 1u64.., s in 1u64..) {
        let compact = normalize(&SignatureComponents::split(v, format!("{:x}", r), format!("{:x}", s))).unwrap();
        prop_assert_eq!(&compact.r()[24..], &r.to_be_bytes()[..]);
        prop_assert_eq!(&compact.s()[24..], &s.to_be_bytes()[..]);
        prop_assert!(compact.r()[..24].iter().all(|b| *b == 0));
    }

    #[test]
    fn recovery_ids_above_three_rejected(v in 4u64..27) {
        prop_assert!(normalize(&SignatureComponents::split(v, "11", "22")).is_err());
    }

    #[test]
    fn c32_addresses_roundtrip(
        version in prop::sample::select(vec![20u8, 21, 22, 26]),
        hash in prop::array::uniform20(any::<u8>()),
    ) {
        let address = StacksAddress::new(version, hash).unwrap();
        let encoded = address.to_c32();
        prop_assert!(encoded.starts_with('S'));
        prop_assert_eq!(StacksAddress::from_c32(&encoded).unwrap(), address);
    }

    #[test]
    fn stx_amounts_roundtrip(micro in any::<u64>()) {
        prop_assert_eq!(parse_stx(&format_stx(micro as u128)).unwrap(), micro);
    }
}
