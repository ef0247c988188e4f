use foreign_bridge::{send, CharArray, ForeignBuffer, InteropError, Message, Reply};
use proptest::prelude::*;

fn view(bytes: &mut [u8]) -> ForeignBuffer {
    unsafe { ForeignBuffer::from_raw_parts(bytes.as_mut_ptr(), bytes.len()) }.unwrap()
}

proptest! {
    #[test]
    fn write_then_read_returns_value(
        mut bytes in prop::collection::vec(any::<u8>(), 1..256),
        seed in any::<usize>(),
        value in any::<u8>(),
    ) {
        let index = (seed % bytes.len()) as i64;
        let buffer = view(&mut bytes);

        prop_assert_eq!(buffer.write(index, value).unwrap(), value);
        prop_assert_eq!(buffer.read(index).unwrap(), value);
    }
}

proptest! {
    #[test]
    fn out_of_range_access_fails_without_mutation(
        mut bytes in prop::collection::vec(any::<u8>(), 0..64),
        offset in 0i64..1024,
        negative in any::<bool>(),
    ) {
        let length = bytes.len();
        let index = if negative { -1 - offset } else { length as i64 + offset };
        let before = bytes.clone();
        let buffer = view(&mut bytes);

        prop_assert_eq!(
            buffer.write(index, 0xff),
            Err(InteropError::OutOfBounds { index, length })
        );
        prop_assert!(buffer.read(index).is_err());
        prop_assert_eq!(buffer.to_vec(), before);
    }
}

proptest! {
    #[test]
    fn size_and_address_are_stable(
        mut bytes in prop::collection::vec(any::<u8>(), 0..128),
        writes in prop::collection::vec((any::<usize>(), any::<u8>()), 0..32),
    ) {
        let length = bytes.len();
        let buffer = view(&mut bytes);
        let address = buffer.unbox();

        for (seed, value) in writes {
            if length > 0 {
                buffer.write((seed % length) as i64, value).unwrap();
            }
            prop_assert_eq!(send(&buffer, Message::GetSize).unwrap(), Reply::Size(length));
            prop_assert_eq!(send(&buffer, Message::Unbox).unwrap(), Reply::Address(address));
        }
    }
}

proptest! {
    #[test]
    fn char_array_keeps_contents_across_unbox(
        bytes in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let chars = CharArray::new(bytes.clone());
        let address = chars.unbox();

        prop_assert_eq!(chars.to_vec(), bytes);
        prop_assert_eq!(chars.unbox(), address);
        prop_assert!(chars.is_native());
    }
}
